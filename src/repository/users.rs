//! User-facing repository operations.

use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::User;
use crate::repository::Db;
use crate::repository::filters::Filters;

impl Db<'_> {
    pub async fn get_user(&mut self, id: Uuid) -> Result<User, ApiError> {
        self.get(Filters::new().with("id", id)).await
    }

    pub async fn get_user_by_email(&mut self, email: &str) -> Result<User, ApiError> {
        self.get(Filters::new().with("email", email)).await
    }

    /// Fetch a user by email, creating one when absent. Uniqueness under
    /// concurrency is enforced by the unique index on `users.email`, not
    /// here.
    pub async fn get_or_create_user(&mut self, email: &str) -> Result<(User, bool), ApiError> {
        self.get_or_create(Filters::new().with("email", email))
            .await
    }

    pub async fn count_users(&mut self, filters: Filters) -> Result<i64, ApiError> {
        self.count::<User>(filters).await
    }
}
