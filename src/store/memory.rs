use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::PeriodStore;
use crate::error::AppResult;
use crate::models::{DateRange, NewPeriod, Period};
use crate::stats;

/// Keeps periods in process memory. Used for tests and local runs without Postgres.
#[derive(Default)]
pub struct MemoryPeriodStore {
    periods: RwLock<Vec<Period>>,
}

impl MemoryPeriodStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(periods: &mut [Period]) {
    periods.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(a.id.cmp(&b.id)));
}

#[async_trait]
impl PeriodStore for MemoryPeriodStore {
    async fn list(&self, range: DateRange) -> AppResult<Vec<Period>> {
        let mut found: Vec<Period> = self
            .periods
            .read()
            .await
            .iter()
            .filter(|p| range.contains(p.start_date))
            .cloned()
            .collect();
        newest_first(&mut found);
        Ok(found)
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<Period>> {
        Ok(self.periods.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn find_previous(
        &self,
        before: NaiveDate,
        exclude: Option<Uuid>,
    ) -> AppResult<Option<Period>> {
        let periods = self.periods.read().await;
        Ok(stats::previous_record(&periods, before, exclude).cloned())
    }

    async fn find_recent(&self, limit: i64) -> AppResult<Vec<Period>> {
        let mut all = self.periods.read().await.clone();
        newest_first(&mut all);
        all.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(all)
    }

    async fn insert(&self, new: NewPeriod) -> AppResult<Period> {
        let now = Utc::now();
        let period = Period {
            id: Uuid::new_v4(),
            start_date: new.start_date,
            end_date: new.end_date,
            cycle_length: new.cycle_length,
            notes: new.notes,
            symptoms: new.symptoms,
            mood: new.mood,
            created_at: now,
            updated_at: now,
        };
        self.periods.write().await.push(period.clone());
        Ok(period)
    }

    async fn update(&self, period: &Period) -> AppResult<Option<Period>> {
        let mut periods = self.periods.write().await;
        let Some(slot) = periods.iter_mut().find(|p| p.id == period.id) else {
            return Ok(None);
        };

        *slot = Period {
            created_at: slot.created_at,
            updated_at: Utc::now(),
            ..period.clone()
        };
        Ok(Some(slot.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut periods = self.periods.write().await;
        let before = periods.len();
        periods.retain(|p| p.id != id);
        Ok(periods.len() < before)
    }
}
