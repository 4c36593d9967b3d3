//! Betting API backed by a generic transactional repository layer.
//!
//! The repository layer is the heart of the crate: `repository::session`
//! manages engine/session/transaction lifecycles with rollback-on-error
//! scopes, `repository::filters` compiles `column[_operator]` filter names
//! into SQL predicates, and `repository::entity` provides type-parametric
//! CRUD over any [`models::Record`]. Services and routes are thin
//! compositions on top.

pub mod commands;
pub mod config;
pub mod errors;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;

use std::sync::Arc;

use crate::config::Settings;
use crate::repository::session::SessionManager;
use crate::services::liveness::LivenessProbeService;

/// Shared, read-only per-process state. Sessions are never shared across
/// requests; each handler acquires its own scope from `sessions`.
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub liveness: Arc<LivenessProbeService>,
    pub settings: Settings,
}
