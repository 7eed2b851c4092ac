use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use crate::{error::AppError, routes::query::DashboardQuery, state::AppState};

/// `GET /api/timeseries` - daily pageviews (UTC days, no zero-fill).
#[tracing::instrument(skip(state))]
pub async fn get_timeseries(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (domain, window) = query.resolve()?;
    let result = state
        .repo
        .get_pageviews_time_series(domain, &window)
        .await?;
    Ok(Json(result))
}
