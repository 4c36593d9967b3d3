//! Bet-facing repository operations.

use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::{Bet, BetStatus, EventStatus, User};
use crate::repository::filters::Filters;
use crate::repository::{Db, persisted_id};

impl Db<'_> {
    /// Record a new bet for the user, opening in `Pending`.
    pub async fn create_bet(
        &mut self,
        user: &User,
        event_id: Uuid,
        amount: Decimal,
    ) -> Result<Bet, ApiError> {
        let user_id = persisted_id(user)?;
        self.create(Bet::new(event_id, user_id, amount)).await
    }

    /// All bets made by a user, newest first, with any extra filters applied.
    pub async fn get_user_bets(
        &mut self,
        user: &User,
        filters: Filters,
    ) -> Result<Vec<Bet>, ApiError> {
        let filters = filters.with("user_id", persisted_id(user)?);
        self.get_many(filters).await
    }

    /// Transition a single bet's status. Pending bets may move to a terminal
    /// state; a terminal bet is immutable.
    pub async fn update_bet_status(
        &mut self,
        bet_id: Uuid,
        status: BetStatus,
    ) -> Result<Bet, ApiError> {
        let mut bet: Bet = self.get(Filters::new().with("id", bet_id)).await?;
        if bet.status.is_final() {
            return Err(ApiError::Client(
                "cannot update the status of a final bet".to_string(),
            ));
        }
        bet.status = status;
        self.update(bet).await
    }

    /// Settle every bet on an event in one statement. This is an
    /// authoritative settlement action, so the single-bet final-state guard
    /// is intentionally bypassed. Does not commit — the enclosing
    /// transaction scope does.
    pub async fn update_event_bets(
        &mut self,
        event_id: Uuid,
        status: EventStatus,
    ) -> Result<(), ApiError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE bets SET status = ");
        qb.push_bind(status);
        qb.push(", updated_at = now() WHERE event_id = ");
        qb.push_bind(event_id);
        qb.build().execute(self.session.connection()?).await?;
        Ok(())
    }
}
