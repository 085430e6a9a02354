use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use super::PeriodStore;
use crate::error::AppResult;
use crate::models::{DateRange, NewPeriod, Period};

const COLUMNS: &str =
    "id, start_date, end_date, cycle_length, notes, symptoms, mood, created_at, updated_at";

#[derive(Clone)]
pub struct PgPeriodStore {
    pool: PgPool,
}

impl PgPeriodStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn log_db_error(op: &str, e: &sqlx::Error) {
    if let Some(db_err) = e.as_database_error() {
        tracing::error!("❌ DB {} failed: {}", op, db_err.message());

        if let Some(code) = db_err.code() {
            tracing::info!("ℹ️ SQLSTATE code: {}", code);
        }

        if let Some(constraint) = db_err.constraint() {
            tracing::info!("🔒 Constraint violated: {}", constraint);
        }
    } else {
        tracing::error!("❌ DB {} failed: {}", op, e);
    }
}

#[async_trait]
impl PeriodStore for PgPeriodStore {
    async fn list(&self, range: DateRange) -> AppResult<Vec<Period>> {
        let rows = sqlx::query_as::<_, Period>(&format!(
            "SELECT {COLUMNS} FROM periods
             WHERE ($1::date IS NULL OR start_date >= $1)
               AND ($2::date IS NULL OR start_date <= $2)
             ORDER BY start_date DESC, id ASC"
        ))
        .bind(range.from)
        .bind(range.to)
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| log_db_error("list", e))?;

        Ok(rows)
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<Period>> {
        let row = sqlx::query_as::<_, Period>(&format!("SELECT {COLUMNS} FROM periods WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .inspect_err(|e| log_db_error("find", e))?;

        Ok(row)
    }

    async fn find_previous(
        &self,
        before: NaiveDate,
        exclude: Option<Uuid>,
    ) -> AppResult<Option<Period>> {
        let row = sqlx::query_as::<_, Period>(&format!(
            "SELECT {COLUMNS} FROM periods
             WHERE start_date < $1
               AND ($2::uuid IS NULL OR id <> $2)
             ORDER BY start_date DESC, id ASC
             LIMIT 1"
        ))
        .bind(before)
        .bind(exclude)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| log_db_error("previous lookup", e))?;

        Ok(row)
    }

    async fn find_recent(&self, limit: i64) -> AppResult<Vec<Period>> {
        let rows = sqlx::query_as::<_, Period>(&format!(
            "SELECT {COLUMNS} FROM periods ORDER BY start_date DESC, id ASC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| log_db_error("recent lookup", e))?;

        Ok(rows)
    }

    async fn insert(&self, new: NewPeriod) -> AppResult<Period> {
        let row = sqlx::query_as::<_, Period>(&format!(
            "INSERT INTO periods (id, start_date, end_date, cycle_length, notes, symptoms, mood)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.cycle_length)
        .bind(new.notes)
        .bind(new.symptoms)
        .bind(new.mood)
        .fetch_one(&self.pool)
        .await
        .inspect_err(|e| log_db_error("insert", e))?;

        Ok(row)
    }

    async fn update(&self, period: &Period) -> AppResult<Option<Period>> {
        let row = sqlx::query_as::<_, Period>(&format!(
            "UPDATE periods
             SET start_date = $2, end_date = $3, cycle_length = $4,
                 notes = $5, symptoms = $6, mood = $7, updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(period.id)
        .bind(period.start_date)
        .bind(period.end_date)
        .bind(period.cycle_length)
        .bind(&period.notes)
        .bind(&period.symptoms)
        .bind(&period.mood)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| log_db_error("update", e))?;

        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM periods WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .inspect_err(|e| log_db_error("delete", e))?;

        Ok(result.rows_affected() > 0)
    }
}
