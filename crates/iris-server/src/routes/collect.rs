use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::info;

use iris_core::event::{CollectPayload, Event};

use crate::{error::AppError, state::AppState};

/// Maximum number of beacons accepted by `POST /api/events`.
pub const MAX_BATCH: usize = 50;

/// `POST /api/event` — ingest one beacon.
///
/// The server assigns `id` and `timestamp` (client values are ignored) and
/// truncates long property strings before the insert.
///
/// ## Response
/// `202 Accepted` with `{ "ok": true }`. A missing domain is `400`; a storage
/// failure is `500` and nothing is stored.
#[tracing::instrument(skip(state, payload))]
pub async fn track_event(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CollectPayload>,
) -> Result<impl IntoResponse, AppError> {
    let event = prepare(&state, payload)?;
    store(&state, &event).await?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "ok": true }))))
}

/// `POST /api/events` — ingest a JSON array of up to 50 beacons.
///
/// Every beacon is validated before anything is written. Inserts then run in
/// order and stop at the first failure, which is reported; earlier events in
/// the batch stay stored.
#[tracing::instrument(skip(state, payloads))]
pub async fn track_events(
    State(state): State<Arc<AppState>>,
    Json(payloads): Json<Vec<CollectPayload>>,
) -> Result<impl IntoResponse, AppError> {
    if payloads.len() > MAX_BATCH {
        return Err(AppError::BatchTooLarge(payloads.len()));
    }
    if payloads.is_empty() {
        return Err(AppError::BadRequest("empty batch".to_string()));
    }

    let events = payloads
        .into_iter()
        .map(|p| prepare(&state, p))
        .collect::<Result<Vec<Event>, AppError>>()?;

    for event in &events {
        store(&state, event).await?;
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "ok": true, "accepted": events.len() })),
    ))
}

fn prepare(state: &AppState, payload: CollectPayload) -> Result<Event, AppError> {
    if payload.domain.is_empty() {
        return Err(AppError::BadRequest("domain is required".to_string()));
    }
    Ok(payload.into_event(state.config.max_property_len))
}

async fn store(state: &AppState, event: &Event) -> Result<(), AppError> {
    if let Err(e) = state.repo.insert(event).await {
        tracing::error!(event_id = %event.id, error = %e, "Event insert failed");
        return Err(e.into());
    }
    info!(
        event_name = %event.event_name,
        pageview = event.is_pageview(),
        domain = %event.domain,
        site_id = %event.site_id,
        url = %event.url,
        "Event stored"
    );
    Ok(())
}
