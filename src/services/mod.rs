//! Service layer: thin business rules composed over the repository facade.

pub mod auth;
pub mod bets;
pub mod events;
pub mod liveness;
