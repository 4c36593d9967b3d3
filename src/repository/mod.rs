//! Transactional repository layer.
//!
//! `SessionManager` owns the engine and hands out sessions; `Db` binds one
//! session and exposes generic CRUD (`entity`) plus domain-named operations
//! for bets and users. Low-level constraint violations are translated into
//! domain error kinds exactly once, at the repository boundary.

pub mod entity;
pub mod filters;
pub mod session;

mod bets;
mod users;

use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::User;
use crate::repository::session::Session;

/// Repository facade bound to one session for one unit of work.
pub struct Db<'s> {
    session: &'s mut Session,
}

impl<'s> Db<'s> {
    pub fn new(session: &'s mut Session) -> Self {
        Self { session }
    }

    pub fn session_mut(&mut self) -> &mut Session {
        self.session
    }
}

fn persisted_id(user: &User) -> Result<Uuid, ApiError> {
    user.id
        .ok_or_else(|| ApiError::Client("user has not been persisted".to_string()))
}
