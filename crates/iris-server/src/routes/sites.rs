use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};

use crate::{error::AppError, state::AppState};

/// `GET /api/sites` - every known site id / domain pair.
#[tracing::instrument(skip(state))]
pub async fn list_sites(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let result = state.repo.get_sites().await?;
    Ok(Json(result))
}
