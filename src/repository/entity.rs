//! Generic CRUD over any [`Record`] type, parameterized by filters.
//!
//! Every operation runs against the one session the facade was bound to and
//! compiles supplied filters through the predicate builder. Queries are
//! assembled with `QueryBuilder`; column names only ever come from the
//! entity's static registry, values are always bind parameters.

use sqlx::{Postgres, QueryBuilder};
use tracing::error;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::Record;
use crate::repository::Db;
use crate::repository::filters::{Filters, Predicate, push_value};

fn select_query<T: Record>(
    projection: &str,
    filters: &Filters,
) -> Result<QueryBuilder<'static, Postgres>, ApiError> {
    let mut qb = QueryBuilder::new(format!("SELECT {projection} FROM {}", T::TABLE));
    if !filters.is_empty() {
        qb.push(" WHERE ");
        for (i, (name, value)) in filters.iter().enumerate() {
            if i > 0 {
                qb.push(" AND ");
            }
            Predicate::build(T::COLUMNS, name, value)?.push_onto(&mut qb);
        }
    }
    Ok(qb)
}

fn map_create_error(err: sqlx::Error, entity: &str, id: Option<Uuid>) -> ApiError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return ApiError::AlreadyExists(match id {
                Some(id) => format!("{entity} with id {id} already exists"),
                None => format!("{entity} already exists"),
            });
        }
    }
    ApiError::from(err)
}

impl Db<'_> {
    /// Insert a record and commit the session's work so far (under a
    /// transaction scope this is a checkpoint; the scope commits for real at
    /// exit), then return it refreshed from the store so server-assigned
    /// defaults (id, timestamps) are populated. A duplicate key maps to
    /// `AlreadyExists`; any other persistence error propagates unchanged.
    pub async fn create<T: Record>(&mut self, record: T) -> Result<T, ApiError> {
        let values = record.insert_values();
        let id = record.id();

        let mut qb = QueryBuilder::<Postgres>::new(format!("INSERT INTO {} (", T::TABLE));
        for (i, (column, _)) in values.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(*column);
        }
        qb.push(") VALUES (");
        for (i, (_, value)) in values.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            push_value(&mut qb, value);
        }
        qb.push(") RETURNING *");

        let created = qb
            .build_query_as::<T>()
            .fetch_one(self.session.connection()?)
            .await
            .map_err(|err| map_create_error(err, T::ENTITY, id))?;
        self.session.commit().await?;
        Ok(created)
    }

    /// Rewrite an already-identified record and commit. Last-writer-wins; no
    /// optimistic-concurrency check is performed.
    pub async fn update<T: Record>(&mut self, record: T) -> Result<T, ApiError> {
        let id = record.id().ok_or_else(|| {
            ApiError::Client(format!("cannot update a {} without an id", T::ENTITY))
        })?;
        let values = record.update_values();

        let mut qb = QueryBuilder::<Postgres>::new(format!("UPDATE {} SET ", T::TABLE));
        for (i, (column, value)) in values.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(*column);
            qb.push(" = ");
            push_value(&mut qb, value);
        }
        qb.push(", updated_at = now() WHERE id = ");
        qb.push_bind(id);
        qb.push(" RETURNING *");

        let updated = qb
            .build_query_as::<T>()
            .fetch_one(self.session.connection()?)
            .await
            .map_err(|err| match err {
                sqlx::Error::RowNotFound => {
                    ApiError::NotFound(format!("{} with id {id} not found", T::ENTITY))
                }
                other => ApiError::from(other),
            })?;
        self.session.commit().await?;
        Ok(updated)
    }

    /// First record matching the filters. With several matches an arbitrary
    /// one is returned — callers needing uniqueness must filter down to at
    /// most one row.
    pub async fn get<T: Record>(&mut self, filters: Filters) -> Result<T, ApiError> {
        let mut qb = select_query::<T>("*", &filters)?;
        qb.build_query_as::<T>()
            .fetch_optional(self.session.connection()?)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("{} with filters {filters} not found", T::ENTITY))
            })
    }

    /// All records matching the filters, newest first. Empty filters return
    /// every row of the type.
    pub async fn get_many<T: Record>(&mut self, filters: Filters) -> Result<Vec<T>, ApiError> {
        let mut qb = select_query::<T>("*", &filters)?;
        qb.push(" ORDER BY created_at DESC");
        Ok(qb
            .build_query_as::<T>()
            .fetch_all(self.session.connection()?)
            .await?)
    }

    /// Fetch the record matching the filters, creating it from the filter
    /// values verbatim when absent. The bool is the "created" flag. More
    /// than one match is an ambiguous identity and fails.
    ///
    /// Not atomic: two concurrent callers can both observe zero matches and
    /// both insert. True uniqueness needs a database-level constraint.
    pub async fn get_or_create<T: Record>(
        &mut self,
        filters: Filters,
    ) -> Result<(T, bool), ApiError> {
        let mut rows = self.get_many::<T>(filters.clone()).await?;
        if rows.len() > 1 {
            return Err(ApiError::AlreadyExists(format!(
                "multiple {} rows match filters {filters}",
                T::ENTITY
            )));
        }
        if let Some(row) = rows.pop() {
            return Ok((row, false));
        }
        let record = T::from_filters(&filters)?;
        Ok((self.create(record).await?, true))
    }

    /// Cardinality of the filtered set, without materializing rows.
    pub async fn count<T: Record>(&mut self, filters: Filters) -> Result<i64, ApiError> {
        let mut qb = select_query::<T>("count(id)", &filters)?;
        Ok(qb
            .build_query_scalar::<i64>()
            .fetch_one(self.session.connection()?)
            .await?)
    }

    /// Liveness ping over this session's connection.
    pub async fn is_alive(&mut self) -> bool {
        let conn = match self.session.connection() {
            Ok(conn) => conn,
            Err(err) => {
                error!(error = %err, "database liveness check failed");
                return false;
            }
        };
        match sqlx::query("SELECT 1").execute(conn).await {
            Ok(_) => true,
            Err(err) => {
                error!(error = %err, "database liveness check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bet, User};
    use rust_decimal::Decimal;

    #[test]
    fn test_select_query_sql() {
        let filters = Filters::new()
            .with("user_id", Uuid::nil())
            .with("amount_gt", Decimal::new(5, 0));
        let qb = select_query::<Bet>("*", &filters).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT * FROM bets WHERE user_id = $1 AND amount > $2"
        );
    }

    #[test]
    fn test_select_query_without_filters_has_no_where_clause() {
        let qb = select_query::<User>("count(id)", &Filters::new()).unwrap();
        assert_eq!(qb.sql(), "SELECT count(id) FROM users");
    }

    #[test]
    fn test_select_query_rejects_bad_filter() {
        let filters = Filters::new().with("amount_xyz", 5i64);
        let Err(err) = select_query::<Bet>("*", &filters) else {
            panic!("an unknown operator token must be rejected");
        };
        assert!(matches!(err, ApiError::FilterSyntax(_)), "{err}");
    }

    #[test]
    fn test_unique_violation_maps_to_already_exists() {
        // RowNotFound stands in for "some other persistence error"
        let err = map_create_error(sqlx::Error::RowNotFound, "User", None);
        assert!(matches!(err, ApiError::Database(_)), "{err}");
    }
}
