//! Cycle arithmetic: per-record derived fields, cycle-length derivation and
//! the rolling summary served by `/api/periods/stats/summary`.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{CycleRegularity, CycleStats, Period, RecentCycle};

/// How many of the most recent periods feed the summary.
pub const RECENT_CYCLE_WINDOW: i64 = 6;

/// Fewer qualifying cycle lengths than this and regularity is not judged.
const MIN_CYCLES_FOR_REGULARITY: usize = 3;
const REGULAR_MAX_STD_DEV: f64 = 3.0;
const SOMEWHAT_REGULAR_MAX_STD_DEV: f64 = 7.0;

pub fn is_ongoing(end_date: Option<NaiveDate>) -> bool {
    end_date.is_none()
}

/// Inclusive day count; a period that starts and ends on the same day is 1 day.
pub fn period_days(start_date: NaiveDate, end_date: Option<NaiveDate>) -> Option<i64> {
    end_date.map(|end| (end - start_date).num_days().abs() + 1)
}

/// Whole days from `earlier` to `later`.
pub fn days_between(earlier: NaiveDate, later: NaiveDate) -> i32 {
    (later - earlier).num_days() as i32
}

/// The record with the greatest `start_date` strictly before `before`,
/// skipping `exclude`. Equal start dates resolve to the smallest id.
pub fn previous_record<'a>(
    records: &'a [Period],
    before: NaiveDate,
    exclude: Option<Uuid>,
) -> Option<&'a Period> {
    records
        .iter()
        .filter(|p| p.start_date < before && Some(p.id) != exclude)
        .min_by(|a, b| b.start_date.cmp(&a.start_date).then(a.id.cmp(&b.id)))
}

/// Cycle length for a period starting on `start_date`. Only finalized once the
/// period has an end date and a predecessor exists.
pub fn derive_cycle_length(
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    previous: Option<&Period>,
) -> Option<i32> {
    if is_ongoing(end_date) {
        return None;
    }
    previous.map(|prev| days_between(prev.start_date, start_date))
}

/// Aggregates `recent`, which the caller supplies newest first.
pub fn summarize(recent: &[Period]) -> CycleStats {
    let cycle_lengths: Vec<i64> = recent
        .iter()
        .filter_map(|p| p.cycle_length.map(i64::from))
        .collect();
    let day_counts: Vec<i64> = recent
        .iter()
        .filter_map(|p| period_days(p.start_date, p.end_date))
        .collect();

    let average_cycle_length = rounded_mean(&cycle_lengths);

    let cycle_regularity = match average_cycle_length {
        Some(avg) if cycle_lengths.len() >= MIN_CYCLES_FOR_REGULARITY => {
            classify(std_dev(&cycle_lengths, avg as f64))
        }
        _ => CycleRegularity::InsufficientData,
    };

    CycleStats {
        average_cycle_length,
        average_period_days: rounded_mean(&day_counts),
        last_period_date: recent.first().map(|p| p.start_date),
        cycle_regularity,
        recent_cycles: recent
            .iter()
            .map(|p| RecentCycle {
                start_date: p.start_date,
                cycle_length: p.cycle_length,
                period_days: period_days(p.start_date, p.end_date),
            })
            .collect(),
    }
}

fn rounded_mean(values: &[i64]) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<i64>() as f64 / values.len() as f64;
    // half-up, positive values only
    Some((mean + 0.5).floor() as i64)
}

/// Population standard deviation around `center`.
fn std_dev(values: &[i64], center: f64) -> f64 {
    let variance = values
        .iter()
        .map(|&v| (v as f64 - center).powi(2))
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

fn classify(std_dev: f64) -> CycleRegularity {
    if std_dev <= REGULAR_MAX_STD_DEV {
        CycleRegularity::Regular
    } else if std_dev <= SOMEWHAT_REGULAR_MAX_STD_DEV {
        CycleRegularity::SomewhatRegular
    } else {
        CycleRegularity::Irregular
    }
}
