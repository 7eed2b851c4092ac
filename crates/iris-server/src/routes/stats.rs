use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use crate::{error::AppError, routes::query::DashboardQuery, state::AppState};

/// `GET /api/stats` - pageviews, unique visitors and sessions.
#[tracing::instrument(skip(state))]
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (domain, window) = query.resolve()?;
    let result = state.repo.get_stats(domain, &window).await?;
    Ok(Json(result))
}
