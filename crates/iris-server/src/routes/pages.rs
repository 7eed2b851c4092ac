use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use crate::{error::AppError, routes::query::DashboardQuery, state::AppState};

/// `GET /api/pages` - most viewed URLs.
#[tracing::instrument(skip(state))]
pub async fn get_pages(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (domain, window) = query.resolve()?;
    let limit = state.top_limit(query.limit);
    let result = state.repo.get_top_pages(domain, &window, limit).await?;
    Ok(Json(result))
}
