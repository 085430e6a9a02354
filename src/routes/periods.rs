use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    CreatePeriodRequest, CycleStats, DateRange, PeriodRangeQuery, PeriodView, UpdatePeriodRequest,
};
use crate::stats::{self, RECENT_CYCLE_WINDOW};
use crate::store::{PeriodStore, SharedStore};

pub fn routes(store: SharedStore) -> Router {
    Router::new()
        .route("/api/periods", get(list_periods).post(create_period))
        .route("/api/periods/stats/summary", get(get_cycle_stats))
        .route(
            "/api/periods/:id",
            get(get_period).put(update_period).delete(delete_period),
        )
        .with_state(store)
}

fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("Invalid period id: {raw:?}")))
}

/// Looks up the predecessor only when the period is complete.
async fn cycle_length_for(
    store: &dyn PeriodStore,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    exclude: Option<Uuid>,
) -> AppResult<Option<i32>> {
    if stats::is_ongoing(end_date) {
        return Ok(None);
    }
    let previous = store.find_previous(start_date, exclude).await?;
    Ok(stats::derive_cycle_length(start_date, end_date, previous.as_ref()))
}

async fn list_periods(
    State(store): State<SharedStore>,
    query: Result<Query<PeriodRangeQuery>, QueryRejection>,
) -> AppResult<Json<Vec<PeriodView>>> {
    let Query(query) = query?;
    let range = DateRange::try_from(query)?;

    let periods = store.list(range).await?;
    Ok(Json(periods.iter().map(PeriodView::from).collect()))
}

async fn get_period(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> AppResult<Json<PeriodView>> {
    let id = parse_id(&id)?;

    let Some(period) = store.find(id).await? else {
        return Err(AppError::NotFound("Period"));
    };
    Ok(Json(PeriodView::from(&period)))
}

async fn create_period(
    State(store): State<SharedStore>,
    body: Result<Json<CreatePeriodRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<PeriodView>)> {
    let Json(body) = body?;
    let mut new = body.validate()?;

    new.cycle_length = cycle_length_for(store.as_ref(), new.start_date, new.end_date, None).await?;

    let period = store.insert(new).await?;
    tracing::info!("🩸 Period {} logged from {}", period.id, period.start_date);

    Ok((StatusCode::CREATED, Json(PeriodView::from(&period))))
}

async fn update_period(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    body: Result<Json<UpdatePeriodRequest>, JsonRejection>,
) -> AppResult<Json<PeriodView>> {
    let id = parse_id(&id)?;
    let Json(body) = body?;

    let Some(mut period) = store.find(id).await? else {
        return Err(AppError::NotFound("Period"));
    };

    body.apply_to(&mut period)?;
    period.cycle_length =
        cycle_length_for(store.as_ref(), period.start_date, period.end_date, Some(period.id))
            .await?;

    let Some(saved) = store.update(&period).await? else {
        // deleted between the read and the write
        return Err(AppError::NotFound("Period"));
    };
    Ok(Json(PeriodView::from(&saved)))
}

async fn delete_period(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = parse_id(&id)?;

    if !store.delete(id).await? {
        return Err(AppError::NotFound("Period"));
    }
    tracing::info!("🗑️ Period {} deleted", id);

    Ok(Json(json!({ "message": "Period deleted successfully" })))
}

async fn get_cycle_stats(State(store): State<SharedStore>) -> AppResult<Json<CycleStats>> {
    let recent = store.find_recent(RECENT_CYCLE_WINDOW).await?;
    Ok(Json(stats::summarize(&recent)))
}
