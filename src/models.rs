use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::stats;

/// A stored period row. Derived fields live on [`PeriodView`].
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Period {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub cycle_length: Option<i32>,
    pub notes: String,
    pub symptoms: Vec<String>,
    pub mood: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// JSON shape of a period, with `periodDays` and `isOngoing` projected in.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodView {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub cycle_length: Option<i32>,
    pub notes: String,
    pub symptoms: Vec<String>,
    pub mood: String,
    pub period_days: Option<i64>,
    pub is_ongoing: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Period> for PeriodView {
    fn from(p: &Period) -> Self {
        Self {
            id: p.id,
            start_date: p.start_date,
            end_date: p.end_date,
            cycle_length: p.cycle_length,
            notes: p.notes.clone(),
            symptoms: p.symptoms.clone(),
            mood: p.mood.clone(),
            period_days: stats::period_days(p.start_date, p.end_date),
            is_ongoing: stats::is_ongoing(p.end_date),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// A validated period ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewPeriod {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub cycle_length: Option<i32>,
    pub notes: String,
    pub symptoms: Vec<String>,
    pub mood: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePeriodRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub notes: Option<String>,
    pub symptoms: Option<Vec<String>>,
    pub mood: Option<String>,
}

impl CreatePeriodRequest {
    pub fn validate(self) -> AppResult<NewPeriod> {
        let start_date = match non_empty(self.start_date) {
            Some(raw) => parse_date("startDate", &raw)?,
            None => return Err(AppError::Validation("startDate is required".into())),
        };
        let end_date = non_empty(self.end_date)
            .map(|raw| parse_date("endDate", &raw))
            .transpose()?;

        Ok(NewPeriod {
            start_date,
            end_date,
            cycle_length: None,
            notes: self.notes.unwrap_or_default(),
            symptoms: self.symptoms.unwrap_or_default(),
            mood: self.mood.unwrap_or_default(),
        })
    }
}

/// Partial update. `endDate` distinguishes "absent" from an explicit null.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePeriodRequest {
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Option<String>>,
    pub notes: Option<String>,
    pub symptoms: Option<Vec<String>>,
    pub mood: Option<String>,
}

impl UpdatePeriodRequest {
    /// Merges the request into `period`. Leaves `cycle_length` for the caller.
    pub fn apply_to(self, period: &mut Period) -> AppResult<()> {
        if let Some(raw) = non_empty(self.start_date) {
            period.start_date = parse_date("startDate", &raw)?;
        }
        if let Some(end) = self.end_date {
            period.end_date = non_empty(end)
                .map(|raw| parse_date("endDate", &raw))
                .transpose()?;
        }
        if let Some(notes) = self.notes {
            period.notes = notes;
        }
        if let Some(symptoms) = self.symptoms {
            period.symptoms = symptoms;
        }
        if let Some(mood) = self.mood {
            period.mood = mood;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Inclusive bounds on a period's start date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

impl TryFrom<PeriodRangeQuery> for DateRange {
    type Error = AppError;

    fn try_from(q: PeriodRangeQuery) -> AppResult<Self> {
        Ok(Self {
            from: non_empty(q.start_date)
                .map(|raw| parse_date("startDate", &raw))
                .transpose()?,
            to: non_empty(q.end_date)
                .map(|raw| parse_date("endDate", &raw))
                .transpose()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CycleRegularity {
    InsufficientData,
    Regular,
    SomewhatRegular,
    Irregular,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentCycle {
    pub start_date: NaiveDate,
    pub cycle_length: Option<i32>,
    pub period_days: Option<i64>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleStats {
    pub average_cycle_length: Option<i64>,
    pub average_period_days: Option<i64>,
    pub last_period_date: Option<NaiveDate>,
    pub cycle_regularity: CycleRegularity,
    pub recent_cycles: Vec<RecentCycle>,
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (the date as written, offset ignored).
pub fn parse_date(field: &str, raw: &str) -> AppResult<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.date_naive())
        .map_err(|_| AppError::Validation(format!("Invalid {field}: {raw:?}")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stored(start: NaiveDate, end: Option<NaiveDate>) -> Period {
        Period {
            id: Uuid::new_v4(),
            start_date: start,
            end_date: end,
            cycle_length: None,
            notes: String::new(),
            symptoms: vec![],
            mood: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn parse_date_accepts_plain_and_timestamp_forms() {
        assert_eq!(parse_date("startDate", "2024-03-01").unwrap(), date(2024, 3, 1));
        assert_eq!(
            parse_date("startDate", "2024-03-01T00:00:00.000Z").unwrap(),
            date(2024, 3, 1)
        );
        assert_eq!(
            parse_date("startDate", "2024-03-01T23:30:00-02:00").unwrap(),
            date(2024, 3, 1)
        );
        assert_eq!(
            parse_date("startDate", "2024-03-01T00:00:00+02:00").unwrap(),
            date(2024, 3, 1)
        );
    }

    #[test]
    fn parse_date_rejects_garbage() {
        let err = parse_date("endDate", "soon").unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("endDate")));
    }

    #[test]
    fn create_requires_start_date() {
        let err = CreatePeriodRequest::default().validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = CreatePeriodRequest {
            start_date: Some("  ".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn create_fills_defaults_and_treats_empty_end_as_ongoing() {
        let new = CreatePeriodRequest {
            start_date: Some("2024-03-01".into()),
            end_date: Some(String::new()),
            ..Default::default()
        }
        .validate()
        .unwrap();

        assert_eq!(new.start_date, date(2024, 3, 1));
        assert_eq!(new.end_date, None);
        assert_eq!(new.cycle_length, None);
        assert!(new.notes.is_empty() && new.mood.is_empty() && new.symptoms.is_empty());
    }

    #[test]
    fn update_distinguishes_absent_and_null_end_date() {
        let absent: UpdatePeriodRequest = serde_json::from_str(r#"{"notes":"x"}"#).unwrap();
        assert!(absent.end_date.is_none());

        let cleared: UpdatePeriodRequest = serde_json::from_str(r#"{"endDate":null}"#).unwrap();
        assert_eq!(cleared.end_date, Some(None));
    }

    #[test]
    fn update_merges_only_present_fields() {
        let mut period = stored(date(2024, 3, 1), Some(date(2024, 3, 5)));
        period.mood = "calm".into();

        let req: UpdatePeriodRequest =
            serde_json::from_str(r#"{"startDate":"","endDate":null,"symptoms":["cramps"]}"#)
                .unwrap();
        req.apply_to(&mut period).unwrap();

        assert_eq!(period.start_date, date(2024, 3, 1));
        assert_eq!(period.end_date, None);
        assert_eq!(period.symptoms, vec!["cramps".to_owned()]);
        assert_eq!(period.mood, "calm");
    }

    #[test]
    fn view_projects_derived_fields() {
        let done = PeriodView::from(&stored(date(2024, 3, 1), Some(date(2024, 3, 5))));
        assert_eq!(done.period_days, Some(5));
        assert!(!done.is_ongoing);

        let open = PeriodView::from(&stored(date(2024, 3, 1), None));
        assert_eq!(open.period_days, None);
        assert!(open.is_ongoing);

        let json = serde_json::to_value(&open).unwrap();
        assert_eq!(json["startDate"], "2024-03-01");
        assert!(json["endDate"].is_null());
        assert!(json["periodDays"].is_null());
        assert_eq!(json["isOngoing"], true);
    }

    #[test]
    fn date_range_is_inclusive() {
        let range = DateRange::try_from(PeriodRangeQuery {
            start_date: Some("2024-01-01".into()),
            end_date: Some("2024-01-31".into()),
        })
        .unwrap();

        assert!(range.contains(date(2024, 1, 1)));
        assert!(range.contains(date(2024, 1, 31)));
        assert!(!range.contains(date(2024, 2, 1)));
        assert!(DateRange::default().contains(date(1999, 1, 1)));
    }

    #[test]
    fn regularity_serializes_kebab_case() {
        let json = serde_json::to_value(CycleRegularity::SomewhatRegular).unwrap();
        assert_eq!(json, "somewhat-regular");
        let json = serde_json::to_value(CycleRegularity::InsufficientData).unwrap();
        assert_eq!(json, "insufficient-data");
    }
}
