//! Bet endpoints (/v1/bets)

use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router, extract::State};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::commands::MakeBet;
use crate::errors::ApiError;
use crate::models::{Bet, BetStatus};
use crate::repository::Db;
use crate::services::auth;
use crate::services::bets::BetsService;

use super::Page;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/v1/bets", post(make_bet).get(get_bets))
}

#[derive(Debug, Deserialize)]
struct MakeBetRequest {
    event_id: Uuid,
    amount: Decimal,
}

#[derive(Debug, Serialize)]
struct BetSchema {
    id: Option<Uuid>,
    event_id: Uuid,
    amount: Decimal,
    status: BetStatus,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<Bet> for BetSchema {
    fn from(bet: Bet) -> Self {
        Self {
            id: bet.id,
            event_id: bet.event_id,
            amount: bet.amount,
            status: bet.status,
            created_at: bet.created_at,
            updated_at: bet.updated_at,
        }
    }
}

/// POST /v1/bets - Make a bet
async fn make_bet(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<MakeBetRequest>,
) -> Result<(StatusCode, Json<BetSchema>), ApiError> {
    let claims = auth::decode_token(
        auth::bearer_token(&headers)?,
        state.settings.secret_key.as_bytes(),
    )?;

    let bet = state
        .sessions
        .transaction(move |session| {
            Box::pin(async move {
                let mut db = Db::new(session);
                let user = auth::current_user(&mut db, &claims).await?;
                BetsService::new(&mut db)
                    .make_bet(MakeBet {
                        user,
                        event_id: req.event_id,
                        amount: req.amount,
                    })
                    .await
            })
        })
        .await?;

    Ok((StatusCode::CREATED, Json(bet.into())))
}

/// GET /v1/bets - All bets of the authenticated user, newest first
async fn get_bets(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Page<BetSchema>>, ApiError> {
    let claims = auth::decode_token(
        auth::bearer_token(&headers)?,
        state.settings.secret_key.as_bytes(),
    )?;

    let bets = state
        .sessions
        .session(move |session| {
            Box::pin(async move {
                let mut db = Db::new(session);
                let user = auth::current_user(&mut db, &claims).await?;
                BetsService::new(&mut db).get_user_bets(&user).await
            })
        })
        .await?;

    Ok(Json(Page::create(
        bets.into_iter().map(BetSchema::from).collect(),
    )))
}
