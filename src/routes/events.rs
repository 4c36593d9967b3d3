//! Event endpoints (/v1/events)

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::put;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::commands::UpdateEvent;
use crate::errors::ApiError;
use crate::models::EventStatus;
use crate::repository::Db;
use crate::services::auth;
use crate::services::events::EventsService;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/v1/events/{event_id}", put(update_event))
}

#[derive(Debug, Deserialize)]
struct UpdateEventRequest {
    status: EventStatus,
}

#[derive(Debug, Serialize)]
struct EventSchema {
    id: Uuid,
    status: EventStatus,
}

/// PUT /v1/events/:event_id - Settle every bet on an event (superusers only)
async fn update_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(event_id): Path<Uuid>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<(StatusCode, Json<EventSchema>), ApiError> {
    let claims = auth::decode_token(
        auth::bearer_token(&headers)?,
        state.settings.secret_key.as_bytes(),
    )?;
    let status = req.status;

    state
        .sessions
        .transaction(move |session| {
            Box::pin(async move {
                let mut db = Db::new(session);
                let user = auth::current_user(&mut db, &claims).await?;
                if !user.is_superuser {
                    return Err(ApiError::PermissionScope(
                        "only superusers can update events".to_string(),
                    ));
                }
                EventsService::new(&mut db)
                    .update_event(UpdateEvent { event_id, status })
                    .await
            })
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(EventSchema {
            id: event_id,
            status,
        }),
    ))
}
