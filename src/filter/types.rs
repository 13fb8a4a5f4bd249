use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::types::Pagination;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "$eq")] Eq,
    #[serde(rename = "$ne")] Neq,
    #[serde(rename = "$gt")] Gt,
    #[serde(rename = "$gte")] Gte,
    #[serde(rename = "$lt")] Lt,
    #[serde(rename = "$lte")] Lte,
    #[serde(rename = "$in")] In,
    #[serde(rename = "$null")] Null,
}

/// Declarative query description: `{ "where": { "organization_id": "..." },
/// "order": "assigned_at desc", "limit": 10, "offset": 20 }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterData {
    pub select: Option<Vec<String>>,
    #[serde(rename = "where")]
    pub where_clause: Option<Value>,
    pub order: Option<Value>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl FilterData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Implicit equality condition, ANDed with any existing conditions
    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.condition(column, value.into())
    }

    pub fn is_null(self, column: &str) -> Self {
        self.condition(column, json!({ "$null": true }))
    }

    pub fn not_null(self, column: &str) -> Self {
        self.condition(column, json!({ "$null": false }))
    }

    pub fn order_by(mut self, spec: &str) -> Self {
        self.order = Some(Value::String(spec.to_string()));
        self
    }

    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.limit = Some(i64::from(pagination.limit));
        self.offset = Some(pagination.offset() as i64);
        self
    }

    fn condition(mut self, column: &str, value: Value) -> Self {
        let mut map = match self.where_clause.take() {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        map.insert(column.to_string(), value);
        self.where_clause = Some(Value::Object(map));
        self
    }
}

#[derive(Debug, Clone)]
pub struct FilterWhereInfo {
    pub column: String,
    pub operator: FilterOp,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}
