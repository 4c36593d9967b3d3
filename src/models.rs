//! Persisted entities and the `Record` capability they expose to the
//! generic repository.
//!
//! Every record carries a unique id and creation/update timestamps. All three
//! are assigned server-side at write time when not pre-populated, so unsaved
//! records hold `None` and are refreshed from `RETURNING *` on create.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::repository::filters::{Filters, Value};

/// Capability contract between an entity and the generic repository: a table
/// name, a column registry for the filter engine, and a column-to-value
/// mapping for writes. Concrete entities satisfy it explicitly; there is no
/// base-class inheritance.
pub trait Record: for<'r> FromRow<'r, PgRow> + Send + Unpin + Sized {
    const TABLE: &'static str;
    /// Entity name used in error messages.
    const ENTITY: &'static str;
    /// Filterable columns; predicate names resolve against this registry.
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> Option<Uuid>;

    /// Columns supplied at insert time. Server defaults fill the rest.
    fn insert_values(&self) -> Vec<(&'static str, Value)>;

    /// Columns rewritten on update (`updated_at` is bumped by the repository).
    fn update_values(&self) -> Vec<(&'static str, Value)>;

    /// Construct a fresh, unsaved record from equality filters — the
    /// `get_or_create` miss path uses the filter values verbatim.
    fn from_filters(filters: &Filters) -> Result<Self, ApiError>;
}

/// Status of a bet. `Pending` is the only non-terminal state; a terminal bet
/// never transitions again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "bet_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Pending,
    Won,
    Lost,
}

impl BetStatus {
    pub fn is_final(self) -> bool {
        matches!(self, BetStatus::Won | BetStatus::Lost)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BetStatus::Pending => "pending",
            BetStatus::Won => "won",
            BetStatus::Lost => "lost",
        }
    }
}

/// Settling an event settles its bets with the same vocabulary.
pub type EventStatus = BetStatus;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub email: String,
    pub is_superuser: bool,
}

impl User {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: None,
            created_at: None,
            updated_at: None,
            email: email.into(),
            is_superuser: false,
        }
    }
}

impl Record for User {
    const TABLE: &'static str = "users";
    const ENTITY: &'static str = "User";
    const COLUMNS: &'static [&'static str] =
        &["id", "created_at", "updated_at", "email", "is_superuser"];

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn insert_values(&self) -> Vec<(&'static str, Value)> {
        let mut values = Vec::new();
        if let Some(id) = self.id {
            values.push(("id", Value::Uuid(id)));
        }
        values.push(("email", Value::Text(self.email.clone())));
        values.push(("is_superuser", Value::Bool(self.is_superuser)));
        values
    }

    fn update_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("email", Value::Text(self.email.clone())),
            ("is_superuser", Value::Bool(self.is_superuser)),
        ]
    }

    fn from_filters(filters: &Filters) -> Result<Self, ApiError> {
        let mut email = None;
        let mut is_superuser = false;
        for (name, value) in filters.iter() {
            match (name, value) {
                ("email", Value::Text(v)) => email = Some(v.clone()),
                ("is_superuser", Value::Bool(v)) => is_superuser = *v,
                _ => {
                    return Err(ApiError::FilterSyntax(format!(
                        "cannot construct a User from filter ({name})"
                    )));
                }
            }
        }
        let email = email.ok_or_else(|| {
            ApiError::FilterSyntax("constructing a User requires an email filter".to_string())
        })?;
        Ok(Self {
            is_superuser,
            ..Self::new(email)
        })
    }
}

/// A bet made by a user on an event. Multiple bets on the same event by the
/// same user are permitted.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Bet {
    pub id: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub status: BetStatus,
}

impl Bet {
    pub fn new(event_id: Uuid, user_id: Uuid, amount: Decimal) -> Self {
        Self {
            id: None,
            created_at: None,
            updated_at: None,
            event_id,
            user_id,
            amount,
            status: BetStatus::Pending,
        }
    }
}

impl Record for Bet {
    const TABLE: &'static str = "bets";
    const ENTITY: &'static str = "Bet";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "created_at",
        "updated_at",
        "event_id",
        "user_id",
        "amount",
        "status",
    ];

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn insert_values(&self) -> Vec<(&'static str, Value)> {
        let mut values = Vec::new();
        if let Some(id) = self.id {
            values.push(("id", Value::Uuid(id)));
        }
        values.push(("event_id", Value::Uuid(self.event_id)));
        values.push(("user_id", Value::Uuid(self.user_id)));
        values.push(("amount", Value::Decimal(self.amount)));
        values.push(("status", Value::Status(self.status)));
        values
    }

    fn update_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("event_id", Value::Uuid(self.event_id)),
            ("user_id", Value::Uuid(self.user_id)),
            ("amount", Value::Decimal(self.amount)),
            ("status", Value::Status(self.status)),
        ]
    }

    fn from_filters(filters: &Filters) -> Result<Self, ApiError> {
        let mut event_id = None;
        let mut user_id = None;
        let mut amount = None;
        let mut status = BetStatus::Pending;
        for (name, value) in filters.iter() {
            match (name, value) {
                ("event_id", Value::Uuid(v)) => event_id = Some(*v),
                ("user_id", Value::Uuid(v)) => user_id = Some(*v),
                ("amount", Value::Decimal(v)) => amount = Some(*v),
                ("status", Value::Status(v)) => status = *v,
                _ => {
                    return Err(ApiError::FilterSyntax(format!(
                        "cannot construct a Bet from filter ({name})"
                    )));
                }
            }
        }
        let missing = |field: &str| {
            ApiError::FilterSyntax(format!("constructing a Bet requires a {field} filter"))
        };
        let mut bet = Bet::new(
            event_id.ok_or_else(|| missing("event_id"))?,
            user_id.ok_or_else(|| missing("user_id"))?,
            amount.ok_or_else(|| missing("amount"))?,
        );
        bet.status = status;
        Ok(bet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_is_the_only_open_status() {
        assert!(!BetStatus::Pending.is_final());
        assert!(BetStatus::Won.is_final());
        assert!(BetStatus::Lost.is_final());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&BetStatus::Pending).unwrap(),
            "\"pending\""
        );
        let status: BetStatus = serde_json::from_str("\"won\"").unwrap();
        assert_eq!(status, BetStatus::Won);
    }

    #[test]
    fn test_new_records_leave_server_fields_unset() {
        let bet = Bet::new(Uuid::new_v4(), Uuid::new_v4(), Decimal::new(1000, 2));
        assert!(bet.id.is_none());
        assert!(bet.created_at.is_none());
        assert!(bet.updated_at.is_none());
        assert_eq!(bet.status, BetStatus::Pending);
        // the insert omits every server-assigned column
        let columns: Vec<_> = bet.insert_values().iter().map(|(c, _)| *c).collect();
        assert_eq!(columns, ["event_id", "user_id", "amount", "status"]);
    }

    #[test]
    fn test_prepopulated_id_is_kept_on_insert() {
        let mut user = User::new("user@example.com");
        user.id = Some(Uuid::new_v4());
        let columns: Vec<_> = user.insert_values().iter().map(|(c, _)| *c).collect();
        assert_eq!(columns, ["id", "email", "is_superuser"]);
    }

    #[test]
    fn test_user_from_filters() {
        let filters = Filters::new().with("email", "user@example.com");
        let user = User::from_filters(&filters).unwrap();
        assert_eq!(user.email, "user@example.com");
        assert!(!user.is_superuser);

        let err = User::from_filters(&Filters::new().with("email_like", "%x%")).unwrap_err();
        assert!(matches!(err, ApiError::FilterSyntax(_)), "{err}");
    }

    #[test]
    fn test_bet_from_filters_requires_identity_columns() {
        let err = Bet::from_filters(&Filters::new().with("event_id", Uuid::new_v4())).unwrap_err();
        assert!(matches!(err, ApiError::FilterSyntax(_)), "{err}");
    }
}
