pub mod bets;
pub mod error;
pub mod events;
pub mod health;

use std::sync::Arc;

use axum::Router;
use serde::Serialize;

use crate::AppState;

/// Build all routes for the API
pub fn build_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(bets::routes())
        .merge(events::routes())
        .merge(health::routes())
}

/// Flat collection envelope for list responses.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn create(items: Vec<T>) -> Self {
        let total = items.len();
        Self { items, total }
    }
}
