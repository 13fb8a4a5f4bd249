use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{postgres::{PgArguments, PgRow}, Arguments, FromRow, PgPool, Postgres};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::filter::types::SqlResult;
use crate::filter::{Filter, FilterData};

pub struct QueryBuilder<T> {
    table_name: String,
    filter: Option<Filter>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table_name: impl Into<String>) -> Result<Self, DatabaseError> {
        let name = table_name.into();
        // Reuse Filter table name validation
        Filter::new(name.as_str()).map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        Ok(Self {
            table_name: name,
            filter: None,
            _phantom: std::marker::PhantomData,
        })
    }

    pub fn filter(mut self, filter_data: FilterData) -> Result<Self, DatabaseError> {
        let mut filter = Filter::new(self.table_name.as_str()).map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        filter
            .assign(filter_data)
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        self.filter = Some(filter);
        Ok(self)
    }

    pub async fn select_all(self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let sql_result = self.sql_result()?;
        let rows = sqlx::query_as_with::<Postgres, T, _>(&sql_result.query, arguments(&sql_result.params))
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    pub async fn select_optional(self, pool: &PgPool) -> Result<Option<T>, DatabaseError> {
        let sql_result = self.sql_result()?;
        let row = sqlx::query_as_with::<Postgres, T, _>(&sql_result.query, arguments(&sql_result.params))
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    pub async fn count(self, pool: &PgPool) -> Result<i64, DatabaseError> {
        let sql_result = match self.filter {
            Some(filter) => filter.to_count_sql().map_err(|e| DatabaseError::QueryError(e.to_string()))?,
            None => SqlResult { query: format!("SELECT COUNT(*) as count FROM \"{}\"", self.table_name), params: vec![] },
        };

        let count = sqlx::query_scalar_with::<Postgres, i64, _>(&sql_result.query, arguments(&sql_result.params))
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    fn sql_result(&self) -> Result<SqlResult, DatabaseError> {
        match &self.filter {
            Some(filter) => filter.to_sql().map_err(|e| DatabaseError::QueryError(e.to_string())),
            None => Ok(SqlResult { query: format!("SELECT * FROM \"{}\"", self.table_name), params: vec![] }),
        }
    }
}

/// Binds JSON filter values with the Postgres types the columns expect.
/// Hyphenated UUIDs and RFC 3339 timestamps arrive as JSON strings but
/// compare against `uuid` and `timestamptz` columns.
pub(crate) fn arguments(params: &[Value]) -> PgArguments {
    let mut args = PgArguments::default();
    for value in params {
        match value {
            Value::Null => args.add(Option::<String>::None),
            Value::Bool(b) => args.add(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    args.add(i)
                } else if let Some(f) = n.as_f64() {
                    args.add(f)
                } else {
                    args.add(n.to_string())
                }
            }
            Value::String(s) => match classify(s) {
                Bound::Uuid(id) => args.add(id),
                Bound::Timestamp(at) => args.add(at),
                Bound::Text => args.add(s.clone()),
            },
            // Arrays are expanded by FilterWhere; objects compare as JSONB
            Value::Array(_) | Value::Object(_) => args.add(sqlx::types::Json(value.clone())),
        }
    }
    args
}

#[derive(Debug, PartialEq)]
enum Bound {
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Text,
}

fn classify(s: &str) -> Bound {
    if s.len() == 36 {
        if let Ok(id) = Uuid::parse_str(s) {
            return Bound::Uuid(id);
        }
    }
    if s.contains('T') {
        if let Ok(at) = DateTime::parse_from_rfc3339(s) {
            return Bound::Timestamp(at.with_timezone(&Utc));
        }
    }
    Bound::Text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_string_parameters() {
        let id = Uuid::new_v4();
        assert_eq!(classify(&id.to_string()), Bound::Uuid(id));
        // Invitation tokens use the 32-char simple form and stay text
        assert_eq!(classify(&id.simple().to_string()), Bound::Text);
        assert!(matches!(classify("2026-03-01T12:00:00Z"), Bound::Timestamp(_)));
        assert_eq!(classify("Team Alpha"), Bound::Text);
    }
}
