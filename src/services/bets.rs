//! Bet placement and listing.

use rust_decimal::Decimal;

use crate::commands::MakeBet;
use crate::errors::ApiError;
use crate::models::{Bet, User};
use crate::repository::Db;
use crate::repository::filters::Filters;

pub struct BetsService<'a, 's> {
    storage: &'a mut Db<'s>,
}

impl<'a, 's> BetsService<'a, 's> {
    pub fn new(storage: &'a mut Db<'s>) -> Self {
        Self { storage }
    }

    pub async fn make_bet(&mut self, command: MakeBet) -> Result<Bet, ApiError> {
        if command.user.is_superuser {
            return Err(ApiError::PermissionScope(
                "superusers are not allowed to make bets".to_string(),
            ));
        }
        if command.amount < Decimal::ZERO {
            return Err(ApiError::Client(
                "amount must be a positive number".to_string(),
            ));
        }
        self.storage
            .create_bet(&command.user, command.event_id, command.amount)
            .await
    }

    pub async fn get_user_bets(&mut self, user: &User) -> Result<Vec<Bet>, ApiError> {
        self.storage.get_user_bets(user, Filters::new()).await
    }
}
