use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{DateRange, NewPeriod, Period};

mod memory;
mod postgres;

pub use memory::MemoryPeriodStore;
pub use postgres::PgPeriodStore;

/// Store handle shared by every handler.
pub type SharedStore = Arc<dyn PeriodStore>;

/// Persistence for period records.
///
/// Every listing is ordered by `start_date` descending, ties broken by
/// ascending id, so both backends agree on which record is "previous".
#[async_trait]
pub trait PeriodStore: Send + Sync {
    async fn list(&self, range: DateRange) -> AppResult<Vec<Period>>;

    async fn find(&self, id: Uuid) -> AppResult<Option<Period>>;

    /// Latest period starting strictly before `before`, never `exclude`.
    async fn find_previous(&self, before: NaiveDate, exclude: Option<Uuid>)
        -> AppResult<Option<Period>>;

    async fn find_recent(&self, limit: i64) -> AppResult<Vec<Period>>;

    async fn insert(&self, new: NewPeriod) -> AppResult<Period>;

    /// Writes every mutable field of `period`. `None` if the id no longer exists.
    async fn update(&self, period: &Period) -> AppResult<Option<Period>>;

    /// `false` if nothing was deleted.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}
