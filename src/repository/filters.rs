//! Dynamic filter expressions over entity columns.
//!
//! A filter name is either a plain column name (equality) or
//! `<column>_<operator>` where the trailing underscore-delimited segment is a
//! comparison operator token:
//!
//! - `lt`, `le`, `gt`, `ge`, `ne` — ordering / inequality
//! - `in`, `notin` — (negated) membership over a list value
//! - `is`, `isnot` — identity comparison, for null checks and booleans
//! - `like`, `ilike` — pattern match, case-sensitive / insensitive
//!
//! Examples: `id_lt`, `amount_ge`, `status_in`, `email_ilike`, `is_superuser`
//! (exact column, equality), `is_superuser_is`.
//!
//! Filters are constructed internally, never parsed from request bodies, so a
//! name that fails to resolve against the entity's column registry is a
//! programming defect and surfaces as `ApiError::FilterSyntax`. Building a
//! predicate is pure and deterministic; rendering pushes the column (from the
//! static registry, never from input) as raw SQL and the value as a bind
//! parameter. Multiple filters are combined with `AND` in insertion order.

use std::fmt;
use std::mem;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::BetStatus;

/// A comparison value bindable into a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Uuid(Uuid),
    Text(String),
    Bool(bool),
    Int(i64),
    Decimal(Decimal),
    Timestamp(DateTime<Utc>),
    Status(BetStatus),
    Null,
    List(Vec<Value>),
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Uuid(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl From<BetStatus> for Value {
    fn from(value: BetStatus) -> Self {
        Value::Status(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Timestamp(v) => write!(f, "{v}"),
            Value::Status(v) => write!(f, "{}", v.as_str()),
            Value::Null => write!(f, "null"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// An ordered, request-scoped set of `(filter_name, value)` pairs.
#[derive(Debug, Clone, Default)]
pub struct Filters(Vec<(String, Value)>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Filters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        write!(f, "}}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    Ne,
    In,
    NotIn,
    Is,
    IsNot,
    Like,
    ILike,
}

impl Op {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "lt" => Some(Op::Lt),
            "le" => Some(Op::Le),
            "gt" => Some(Op::Gt),
            "ge" => Some(Op::Ge),
            "ne" => Some(Op::Ne),
            "in" => Some(Op::In),
            "notin" => Some(Op::NotIn),
            "is" => Some(Op::Is),
            "isnot" => Some(Op::IsNot),
            "like" => Some(Op::Like),
            "ilike" => Some(Op::ILike),
            _ => None,
        }
    }
}

/// One compiled boolean column predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    column: &'static str,
    op: Op,
    value: Value,
}

impl Predicate {
    /// Resolve a `(filter_name, value)` pair against an entity's column
    /// registry. Exact column names compare for equality; otherwise the
    /// trailing `_token` segment selects the operator.
    pub fn build(
        columns: &'static [&'static str],
        name: &str,
        value: &Value,
    ) -> Result<Self, ApiError> {
        if let Some(column) = columns.iter().find(|column| **column == name) {
            let predicate = Self {
                column,
                op: Op::Eq,
                value: value.clone(),
            };
            predicate.check_value_shape(name)?;
            return Ok(predicate);
        }

        let Some((column_part, token)) = name.rsplit_once('_') else {
            return Err(ApiError::FilterSyntax(format!("unknown filter ({name})")));
        };
        let Some(op) = Op::from_token(token) else {
            return Err(ApiError::FilterSyntax(format!("unknown filter ({name})")));
        };
        let Some(column) = columns.iter().find(|column| **column == column_part) else {
            return Err(ApiError::FilterSyntax(format!("unknown filter ({name})")));
        };

        let predicate = Self {
            column,
            op,
            value: value.clone(),
        };
        predicate.check_value_shape(name)?;
        Ok(predicate)
    }

    /// Membership operators take a homogeneous list; everything else takes a
    /// scalar. Checked here so rendering cannot fail.
    fn check_value_shape(&self, name: &str) -> Result<(), ApiError> {
        match (self.op, &self.value) {
            (Op::In | Op::NotIn, Value::List(items)) => {
                let mut discriminants = items.iter().map(mem::discriminant);
                if let Some(first) = discriminants.next() {
                    if items.iter().any(|item| matches!(item, Value::List(_) | Value::Null))
                        || discriminants.any(|d| d != first)
                    {
                        return Err(ApiError::FilterSyntax(format!(
                            "filter {name} requires a homogeneous list of scalars"
                        )));
                    }
                }
                Ok(())
            }
            (Op::In | Op::NotIn, _) => Err(ApiError::FilterSyntax(format!(
                "filter {name} requires a list value"
            ))),
            (_, Value::List(_)) => Err(ApiError::FilterSyntax(format!(
                "filter {name} does not accept a list value"
            ))),
            (Op::Is | Op::IsNot, _) => Ok(()),
            // `col = NULL` matches nothing in SQL; force the identity operators
            (_, Value::Null) => Err(ApiError::FilterSyntax(format!(
                "filter {name} cannot compare with null; use _is or _isnot"
            ))),
            _ => Ok(()),
        }
    }

    #[cfg(test)]
    pub(crate) fn parts(&self) -> (&'static str, Op, &Value) {
        (self.column, self.op, &self.value)
    }

    /// Append `column <op> $n` to the query. Empty membership lists collapse
    /// to a constant so the parameter type never has to be inferred.
    pub(crate) fn push_onto(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        if let Value::List(items) = &self.value {
            if items.is_empty() {
                match self.op {
                    Op::In => qb.push("FALSE"),
                    _ => qb.push("TRUE"),
                };
                return;
            }
        }

        qb.push(self.column);
        match self.op {
            Op::Eq => {
                qb.push(" = ");
                push_value(qb, &self.value);
            }
            Op::Lt => {
                qb.push(" < ");
                push_value(qb, &self.value);
            }
            Op::Le => {
                qb.push(" <= ");
                push_value(qb, &self.value);
            }
            Op::Gt => {
                qb.push(" > ");
                push_value(qb, &self.value);
            }
            Op::Ge => {
                qb.push(" >= ");
                push_value(qb, &self.value);
            }
            Op::Ne => {
                qb.push(" <> ");
                push_value(qb, &self.value);
            }
            Op::In => {
                qb.push(" = ANY(");
                push_list(qb, &self.value);
                qb.push(")");
            }
            Op::NotIn => {
                qb.push(" <> ALL(");
                push_list(qb, &self.value);
                qb.push(")");
            }
            Op::Is => {
                qb.push(" IS NOT DISTINCT FROM ");
                push_value(qb, &self.value);
            }
            Op::IsNot => {
                qb.push(" IS DISTINCT FROM ");
                push_value(qb, &self.value);
            }
            Op::Like => {
                qb.push(" LIKE ");
                push_value(qb, &self.value);
            }
            Op::ILike => {
                qb.push(" ILIKE ");
                push_value(qb, &self.value);
            }
        }
    }
}

pub(crate) fn push_value(qb: &mut QueryBuilder<'static, Postgres>, value: &Value) {
    match value {
        Value::Uuid(v) => {
            qb.push_bind(*v);
        }
        Value::Text(v) => {
            qb.push_bind(v.clone());
        }
        Value::Bool(v) => {
            qb.push_bind(*v);
        }
        Value::Int(v) => {
            qb.push_bind(*v);
        }
        Value::Decimal(v) => {
            qb.push_bind(*v);
        }
        Value::Timestamp(v) => {
            qb.push_bind(*v);
        }
        Value::Status(v) => {
            qb.push_bind(*v);
        }
        Value::Null => {
            qb.push("NULL");
        }
        // Lists only appear under membership operators; `Predicate::build`
        // rejects them everywhere else.
        Value::List(_) => {
            qb.push("NULL");
        }
    }
}

fn push_list(qb: &mut QueryBuilder<'static, Postgres>, value: &Value) {
    let Value::List(items) = value else {
        qb.push("NULL");
        return;
    };
    match items.first() {
        Some(Value::Uuid(_)) => {
            let list: Vec<Uuid> = items
                .iter()
                .filter_map(|item| match item {
                    Value::Uuid(v) => Some(*v),
                    _ => None,
                })
                .collect();
            qb.push_bind(list);
        }
        Some(Value::Text(_)) => {
            let list: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::Text(v) => Some(v.clone()),
                    _ => None,
                })
                .collect();
            qb.push_bind(list);
        }
        Some(Value::Bool(_)) => {
            let list: Vec<bool> = items
                .iter()
                .filter_map(|item| match item {
                    Value::Bool(v) => Some(*v),
                    _ => None,
                })
                .collect();
            qb.push_bind(list);
        }
        Some(Value::Int(_)) => {
            let list: Vec<i64> = items
                .iter()
                .filter_map(|item| match item {
                    Value::Int(v) => Some(*v),
                    _ => None,
                })
                .collect();
            qb.push_bind(list);
        }
        Some(Value::Decimal(_)) => {
            let list: Vec<Decimal> = items
                .iter()
                .filter_map(|item| match item {
                    Value::Decimal(v) => Some(*v),
                    _ => None,
                })
                .collect();
            qb.push_bind(list);
        }
        Some(Value::Timestamp(_)) => {
            let list: Vec<DateTime<Utc>> = items
                .iter()
                .filter_map(|item| match item {
                    Value::Timestamp(v) => Some(*v),
                    _ => None,
                })
                .collect();
            qb.push_bind(list);
        }
        Some(Value::Status(_)) => {
            let list: Vec<BetStatus> = items
                .iter()
                .filter_map(|item| match item {
                    Value::Status(v) => Some(*v),
                    _ => None,
                })
                .collect();
            qb.push_bind(list);
        }
        _ => {
            qb.push("NULL");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bet, Record, User};

    fn build(name: &str, value: impl Into<Value>) -> Result<Predicate, ApiError> {
        Predicate::build(Bet::COLUMNS, name, &value.into())
    }

    #[test]
    fn test_exact_column_is_equality() {
        let predicate = build("status", BetStatus::Won).unwrap();
        assert_eq!(
            predicate.parts(),
            ("status", Op::Eq, &Value::Status(BetStatus::Won))
        );
    }

    #[test]
    fn test_operator_suffixes() {
        let cases = [
            ("amount_lt", Op::Lt),
            ("amount_le", Op::Le),
            ("amount_gt", Op::Gt),
            ("amount_ge", Op::Ge),
            ("amount_ne", Op::Ne),
        ];
        for (name, op) in cases {
            let predicate = build(name, Decimal::new(500, 2)).unwrap();
            assert_eq!(predicate.parts().0, "amount");
            assert_eq!(predicate.parts().1, op);
        }
    }

    #[test]
    fn test_column_names_containing_underscores() {
        // user_id resolves as a column, user_id_in as column + operator
        let predicate = build("user_id", Uuid::nil()).unwrap();
        assert_eq!(predicate.parts().1, Op::Eq);

        let predicate = build("user_id_in", vec![Uuid::nil()]).unwrap();
        let expected = Value::List(vec![Value::Uuid(Uuid::nil())]);
        assert_eq!(predicate.parts(), ("user_id", Op::In, &expected));
    }

    #[test]
    fn test_exact_column_wins_over_suffix_split() {
        // "is_superuser" must not parse as column "is" + operator "superuser"
        let predicate = Predicate::build(User::COLUMNS, "is_superuser", &Value::Bool(true)).unwrap();
        assert_eq!(predicate.parts(), ("is_superuser", Op::Eq, &Value::Bool(true)));

        let predicate = Predicate::build(User::COLUMNS, "is_superuser_is", &Value::Bool(true)).unwrap();
        assert_eq!(predicate.parts().1, Op::Is);
    }

    #[test]
    fn test_unknown_operator_token_fails() {
        let err = build("amount_xyz", 5i64).unwrap_err();
        assert!(matches!(err, ApiError::FilterSyntax(_)), "{err}");
    }

    #[test]
    fn test_unknown_column_fails() {
        let err = build("payout_gt", 5i64).unwrap_err();
        assert!(matches!(err, ApiError::FilterSyntax(_)), "{err}");
    }

    #[test]
    fn test_membership_requires_list() {
        let err = build("status_in", BetStatus::Won).unwrap_err();
        assert!(matches!(err, ApiError::FilterSyntax(_)), "{err}");

        let err = build("status", vec![BetStatus::Won]).unwrap_err();
        assert!(matches!(err, ApiError::FilterSyntax(_)), "{err}");
    }

    #[test]
    fn test_null_requires_an_identity_operator() {
        let err = Predicate::build(Bet::COLUMNS, "updated_at", &Value::Null).unwrap_err();
        assert!(matches!(err, ApiError::FilterSyntax(_)), "{err}");

        let err = Predicate::build(Bet::COLUMNS, "updated_at_ne", &Value::Null).unwrap_err();
        assert!(matches!(err, ApiError::FilterSyntax(_)), "{err}");

        assert!(Predicate::build(Bet::COLUMNS, "updated_at_is", &Value::Null).is_ok());
        assert!(Predicate::build(Bet::COLUMNS, "updated_at_isnot", &Value::Null).is_ok());
    }

    #[test]
    fn test_membership_list_must_be_homogeneous() {
        let mixed = Value::List(vec![Value::Int(1), Value::Text("x".into())]);
        let err = Predicate::build(Bet::COLUMNS, "amount_in", &mixed).unwrap_err();
        assert!(matches!(err, ApiError::FilterSyntax(_)), "{err}");
    }

    #[test]
    fn test_deterministic_build() {
        let first = build("amount_gt", Decimal::new(5, 0)).unwrap();
        let second = build("amount_gt", Decimal::new(5, 0)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rendered_sql() {
        let mut qb = QueryBuilder::new("SELECT * FROM bets WHERE ");
        build("amount_gt", Decimal::new(5, 0)).unwrap().push_onto(&mut qb);
        assert_eq!(qb.sql(), "SELECT * FROM bets WHERE amount > $1");

        let mut qb = QueryBuilder::new("SELECT * FROM bets WHERE ");
        build("status_in", vec![BetStatus::Won, BetStatus::Lost])
            .unwrap()
            .push_onto(&mut qb);
        assert_eq!(qb.sql(), "SELECT * FROM bets WHERE status = ANY($1)");

        let mut qb = QueryBuilder::new("SELECT * FROM bets WHERE ");
        build("status_notin", Vec::<BetStatus>::new())
            .unwrap()
            .push_onto(&mut qb);
        assert_eq!(qb.sql(), "SELECT * FROM bets WHERE TRUE");
    }

    #[test]
    fn test_is_renders_null_safe_comparison() {
        let mut qb = QueryBuilder::new("SELECT * FROM bets WHERE ");
        Predicate::build(Bet::COLUMNS, "updated_at_is", &Value::Null)
            .unwrap()
            .push_onto(&mut qb);
        assert_eq!(
            qb.sql(),
            "SELECT * FROM bets WHERE updated_at IS NOT DISTINCT FROM NULL"
        );
    }

    #[test]
    fn test_filters_display() {
        let filters = Filters::new()
            .with("email", "user@example.com")
            .with("is_superuser", false);
        assert_eq!(
            filters.to_string(),
            "{email: user@example.com, is_superuser: false}"
        );
    }
}
