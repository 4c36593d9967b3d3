//! Commands emitted by the transport layer and consumed by the services.
//!
//! A command encapsulates one request to change the system, carrying only
//! already-validated domain values.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{EventStatus, User};

/// Emitted when a user places a new bet.
#[derive(Debug, Clone)]
pub struct MakeBet {
    pub user: User,
    pub event_id: Uuid,
    pub amount: Decimal,
}

/// Emitted when an event is settled.
#[derive(Debug, Clone, Copy)]
pub struct UpdateEvent {
    pub event_id: Uuid,
    pub status: EventStatus,
}
