//! Event settlement.

use crate::commands::UpdateEvent;
use crate::errors::ApiError;
use crate::repository::Db;

pub struct EventsService<'a, 's> {
    storage: &'a mut Db<'s>,
}

impl<'a, 's> EventsService<'a, 's> {
    pub fn new(storage: &'a mut Db<'s>) -> Self {
        Self { storage }
    }

    pub async fn update_event(&mut self, command: UpdateEvent) -> Result<(), ApiError> {
        // TODO: reject settling an event that is already closed, once events
        // are persisted in their own table.
        self.storage
            .update_event_bets(command.event_id, command.status)
            .await
    }
}
