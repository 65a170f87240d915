mod mock;
mod protocol;
mod snowflake;
mod stage;

pub use mock::MockConnector;
pub use snowflake::{default_base_url, SnowflakeClient, SnowflakeConnector};

use crate::credentials::CredentialSet;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub column_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Vec<String>>,
}

impl QueryResult {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn first_value(&self) -> Option<&str> {
        self.rows.first()?.first().map(String::as_str)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// An open warehouse session. Statements run one after another on the same
/// session; `close` releases it.
#[async_trait]
pub trait Warehouse: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<()>;

    async fn query(&self, sql: &str) -> Result<QueryResult>;

    /// Transfers a local file into a named stage.
    async fn put_file(&self, local: &Path, stage: &str) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, credentials: &CredentialSet) -> Result<Box<dyn Warehouse>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> QueryResult {
        QueryResult {
            columns: vec![
                ColumnInfo {
                    name: "created_on".to_string(),
                    column_type: "timestamp_ltz".to_string(),
                },
                ColumnInfo {
                    name: "name".to_string(),
                    column_type: "text".to_string(),
                },
            ],
            rows: vec![vec!["2024-01-01".to_string(), "STATES".to_string()]],
        }
    }

    #[test]
    fn test_column_index_ignores_case() {
        assert_eq!(result().column_index("NAME"), Some(1));
        assert_eq!(result().column_index("missing"), None);
    }

    #[test]
    fn test_first_value() {
        assert_eq!(result().first_value(), Some("2024-01-01"));
        assert_eq!(QueryResult::default().first_value(), None);
    }
}
