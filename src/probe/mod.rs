use crate::credentials::CredentialSet;
use crate::error::{Result, SnowdashError};
use crate::warehouse::{Connector, Warehouse};
use tracing::{info, warn};

const VERSION_SQL: &str = "SELECT CURRENT_VERSION()";
const LIST_TABLES_SQL: &str = "SHOW TABLES";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub version: String,
    pub tables: Vec<String>,
}

pub struct ConnectivityProber<C: Connector> {
    connector: C,
}

impl<C: Connector> ConnectivityProber<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    /// Round-trips a version query and lists the tables of the configured
    /// database and schema.
    pub async fn probe(&self, credentials: &CredentialSet) -> Result<ProbeResult> {
        let warehouse = self.connector.connect(credentials).await?;
        let result = Self::run_probe(warehouse.as_ref()).await;

        if let Err(e) = warehouse.close().await {
            warn!(error = %e, "Failed to close warehouse connection");
        }

        let result = result?;
        info!(
            version = %result.version,
            tables = result.tables.len(),
            database = %credentials.database,
            schema = %credentials.schema,
            "Snowflake is reachable"
        );
        Ok(result)
    }

    async fn run_probe(warehouse: &dyn Warehouse) -> Result<ProbeResult> {
        let version = warehouse
            .query(VERSION_SQL)
            .await?
            .first_value()
            .map(str::to_string)
            .ok_or_else(|| SnowdashError::Query {
                code: String::new(),
                message: "version query returned no rows".to_string(),
            })?;

        let listing = warehouse.query(LIST_TABLES_SQL).await?;
        let name_idx = listing.column_index("name").unwrap_or(1);
        let tables = listing
            .rows
            .iter()
            .filter_map(|row| row.get(name_idx).cloned())
            .collect();

        Ok(ProbeResult { version, tables })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::RawCredentials;
    use crate::warehouse::{ColumnInfo, MockConnector, QueryResult};

    fn credentials() -> CredentialSet {
        RawCredentials {
            account: Some("acme".to_string()),
            user: Some("bob".to_string()),
            password: Some("pw".to_string()),
            ..Default::default()
        }
        .into_credential_set()
        .unwrap()
    }

    fn column(name: &str) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            column_type: "text".to_string(),
        }
    }

    fn version_result() -> QueryResult {
        QueryResult {
            columns: vec![column("CURRENT_VERSION()")],
            rows: vec![vec!["8.42.1".to_string()]],
        }
    }

    fn tables_result() -> QueryResult {
        QueryResult {
            columns: vec![column("created_on"), column("name"), column("database_name")],
            rows: vec![
                vec!["2024-01-01".into(), "SALES".into(), "INCREDIBLE_INDIA".into()],
                vec!["2024-01-02".into(), "STATES".into(), "INCREDIBLE_INDIA".into()],
            ],
        }
    }

    #[tokio::test]
    async fn test_probe_reports_version_and_tables() {
        let connector = MockConnector::new()
            .with_result(VERSION_SQL, version_result())
            .with_result(LIST_TABLES_SQL, tables_result());

        let result = ConnectivityProber::new(connector.clone())
            .probe(&credentials())
            .await
            .unwrap();

        assert_eq!(result.version, "8.42.1");
        assert_eq!(result.tables, vec!["SALES", "STATES"]);
        assert_eq!(connector.closed(), 1);
    }

    #[tokio::test]
    async fn test_probe_query_failure_carries_message() {
        let connector = MockConnector::new()
            .with_result(VERSION_SQL, version_result())
            .failing_on(LIST_TABLES_SQL);

        let err = ConnectivityProber::new(connector.clone())
            .probe(&credentials())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("SHOW TABLES"));
        assert_eq!(connector.closed(), 1);
    }

    #[tokio::test]
    async fn test_probe_connection_failure() {
        let connector = MockConnector::new().refusing_connections();
        let err = ConnectivityProber::new(connector)
            .probe(&credentials())
            .await
            .unwrap_err();
        assert!(matches!(err, SnowdashError::Connection(_)));
    }

    #[tokio::test]
    async fn test_probe_empty_version_is_error() {
        let err = ConnectivityProber::new(MockConnector::new())
            .probe(&credentials())
            .await
            .unwrap_err();
        assert!(matches!(err, SnowdashError::Query { .. }));
    }
}
