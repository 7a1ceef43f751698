use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Errors that can occur when talking to the profile store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Unknown column {column:?} on table {table}")]
    UnknownColumn { table: Table, column: String },
}

/// Tables the discovery core reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Profiles,
    Likes,
    Messages,
}

const PROFILE_COLUMNS: &[&str] = &[
    "id",
    "first_name",
    "last_name",
    "avatar_url",
    "date_of_birth",
    "gender",
    "religion",
    "civil_status",
    "location",
    "bio",
    "interests",
    "job",
    "is_online",
    "last_active",
];

const LIKE_COLUMNS: &[&str] = &["user_id", "liked_profile_id", "status", "created_at"];

/// Columns that identify a like relation
pub const LIKE_CONFLICT_KEYS: &[&str] = &["user_id", "liked_profile_id"];

const MESSAGE_COLUMNS: &[&str] = &[
    "id",
    "conversation_id",
    "sender_id",
    "receiver_id",
    "text",
    "image_url",
    "read",
    "created_at",
];

pub const MESSAGE_CONFLICT_KEYS: &[&str] = &["id"];

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Profiles => "profiles",
            Table::Likes => "likes",
            Table::Messages => "messages",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Table::Profiles => PROFILE_COLUMNS,
            Table::Likes => LIKE_COLUMNS,
            Table::Messages => MESSAGE_COLUMNS,
        }
    }

    /// Reject column names outside the table's whitelist.
    ///
    /// Adapters splice column names into queries, so every name must pass
    /// through here first.
    pub fn check_column(self, column: &str) -> Result<(), StoreError> {
        if self.columns().contains(&column) {
            Ok(())
        } else {
            Err(StoreError::UnknownColumn {
                table: self,
                column: column.to_string(),
            })
        }
    }

    pub fn check_row(self, row: &Value) -> Result<(), StoreError> {
        let object = row
            .as_object()
            .ok_or_else(|| StoreError::InvalidResponse(format!("{} row must be an object", self)))?;

        object.keys().try_for_each(|column| self.check_column(column))
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    Eq(String),
    Neq(String),
    In(Vec<String>),
}

/// Column predicate; values are compared in their text form
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
}

impl Filter {
    pub fn eq(column: &str, value: impl ToString) -> Self {
        Self {
            column: column.to_string(),
            op: FilterOp::Eq(value.to_string()),
        }
    }

    pub fn neq(column: &str, value: impl ToString) -> Self {
        Self {
            column: column.to_string(),
            op: FilterOp::Neq(value.to_string()),
        }
    }

    pub fn in_list<I, V>(column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        Self {
            column: column.to_string(),
            op: FilterOp::In(values.into_iter().map(|v| v.to_string()).collect()),
        }
    }

    /// Evaluate the filter against a JSON row. NULL or missing columns only
    /// satisfy `neq`.
    pub fn matches(&self, row: &Value) -> bool {
        let actual = row.get(&self.column).and_then(text_value);

        match (&self.op, actual) {
            (FilterOp::Eq(expected), Some(actual)) => &actual == expected,
            (FilterOp::Neq(expected), Some(actual)) => &actual != expected,
            (FilterOp::Neq(_), None) => true,
            (FilterOp::In(values), Some(actual)) => values.contains(&actual),
            (_, None) => false,
        }
    }
}

/// Text form of a scalar JSON value
pub fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Request/response access to the hosted relational store.
///
/// Rows travel as JSON objects keyed by column name.
#[async_trait]
pub trait Store: Send + Sync {
    async fn select(&self, table: Table, filters: &[Filter]) -> Result<Vec<Value>, StoreError>;

    async fn insert(&self, table: Table, row: Value) -> Result<(), StoreError>;

    /// Insert, or update the row that collides on `conflict_keys`
    async fn upsert(&self, table: Table, row: Value, conflict_keys: &[&str]) -> Result<(), StoreError>;

    async fn delete(&self, table: Table, filters: &[Filter]) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_matching() {
        let row = json!({"user_id": "a", "status": "pending", "is_online": true, "bio": null});

        assert!(Filter::eq("user_id", "a").matches(&row));
        assert!(!Filter::eq("user_id", "b").matches(&row));
        assert!(Filter::neq("user_id", "b").matches(&row));
        assert!(Filter::eq("is_online", true).matches(&row));
        assert!(Filter::in_list("status", ["accepted", "pending"]).matches(&row));
        assert!(!Filter::eq("bio", "x").matches(&row));
        assert!(Filter::neq("bio", "x").matches(&row));
    }

    #[test]
    fn test_column_whitelist() {
        assert!(Table::Likes.check_column("liked_profile_id").is_ok());
        assert!(Table::Likes.check_column("id; DROP TABLE likes").is_err());
        assert!(Table::Profiles.check_row(&json!({"id": "1", "gender": "male"})).is_ok());
        assert!(Table::Profiles.check_row(&json!({"password": "x"})).is_err());
        assert!(Table::Profiles.check_row(&json!([1, 2])).is_err());
        assert!(Table::Messages.check_column("conversation_id").is_ok());
        assert!(Table::Messages.check_column("liked_profile_id").is_err());
    }
}
