use super::{Connector, QueryResult, Warehouse};
use crate::credentials::CredentialSet;
use crate::error::{Result, SnowdashError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MockState {
    statements: Vec<String>,
    uploads: Vec<(PathBuf, String)>,
    results: Vec<(String, QueryResult)>,
    failures: Vec<String>,
    refuse_connections: bool,
    connections: usize,
    closed: usize,
}

/// In-memory warehouse that records every statement it receives. Query
/// results are matched by SQL prefix; statements containing a registered
/// failure pattern fail with a query error.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_result(self, sql_prefix: impl Into<String>, result: QueryResult) -> Self {
        self.state().results.push((sql_prefix.into(), result));
        self
    }

    pub fn failing_on(self, pattern: impl Into<String>) -> Self {
        self.state().failures.push(pattern.into());
        self
    }

    pub fn refusing_connections(self) -> Self {
        self.state().refuse_connections = true;
        self
    }

    pub fn statements(&self) -> Vec<String> {
        self.state().statements.clone()
    }

    pub fn uploads(&self) -> Vec<(PathBuf, String)> {
        self.state().uploads.clone()
    }

    pub fn connections(&self) -> usize {
        self.state().connections
    }

    pub fn closed(&self) -> usize {
        self.state().closed
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, credentials: &CredentialSet) -> Result<Box<dyn Warehouse>> {
        let mut state = self.state();
        if state.refuse_connections {
            return Err(SnowdashError::Connection(format!(
                "account {} is unreachable",
                credentials.account
            )));
        }
        state.connections += 1;
        Ok(Box::new(MockWarehouse {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockWarehouse {
    state: Arc<Mutex<MockState>>,
}

impl MockWarehouse {
    fn record(&self, sql: &str) -> Result<Option<QueryResult>> {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.statements.push(sql.to_string());
        if let Some(pattern) = state.failures.iter().find(|p| sql.contains(p.as_str())) {
            return Err(SnowdashError::Query {
                code: "000000".to_string(),
                message: format!("mock failure on '{}'", pattern),
            });
        }
        Ok(state
            .results
            .iter()
            .find(|(prefix, _)| sql.starts_with(prefix.as_str()))
            .map(|(_, result)| result.clone()))
    }
}

#[async_trait]
impl Warehouse for MockWarehouse {
    async fn execute(&self, sql: &str) -> Result<()> {
        self.record(sql).map(|_| ())
    }

    async fn query(&self, sql: &str) -> Result<QueryResult> {
        Ok(self.record(sql)?.unwrap_or_default())
    }

    async fn put_file(&self, local: &Path, stage: &str) -> Result<()> {
        let sql = format!("PUT 'file://{}' @{}", local.display(), stage);
        self.record(&sql)?;
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.uploads.push((local.to_path_buf(), stage.to_string()));
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.closed += 1;
        Ok(())
    }
}
