use super::sql_builder::{
    copy_into_sql, create_database_sql, create_schema_sql, create_stage_sql, create_table_sql,
    quote_ident, use_database_sql, use_schema_sql,
};
use crate::credentials::CredentialSet;
use crate::error::{Result, SnowdashError};
use crate::schema::{SchemaInferencer, TableDescriptor};
use crate::warehouse::{Connector, Warehouse};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedTable {
    pub table: String,
    pub source: PathBuf,
    pub columns: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ProvisionReport {
    pub database: String,
    pub schema: String,
    pub tables: Vec<LoadedTable>,
    pub elapsed_ms: u128,
}

/// CSV files directly under `dir`, sorted by path.
pub fn csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(SnowdashError::Provisioning(format!(
            "source directory {} does not exist",
            dir.display()
        )));
    }
    let pattern = format!("{}/*.csv", glob::Pattern::escape(&dir.to_string_lossy()));
    let mut files: Vec<PathBuf> = glob::glob(&pattern)?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

pub struct WarehouseProvisioner<C: Connector> {
    connector: C,
    inferencer: SchemaInferencer,
}

impl<C: Connector> WarehouseProvisioner<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            inferencer: SchemaInferencer::new(),
        }
    }

    pub async fn provision(
        &self,
        credentials: &CredentialSet,
        source_dir: impl AsRef<Path>,
    ) -> Result<ProvisionReport> {
        let source_dir = source_dir.as_ref();
        let files = csv_files(source_dir)?;
        if files.is_empty() {
            warn!(dir = %source_dir.display(), "No CSV files found to load");
        }

        let started = Instant::now();
        let warehouse = self.connector.connect(credentials).await?;
        let result = self.provision_files(warehouse.as_ref(), credentials, &files).await;

        if let Err(e) = warehouse.close().await {
            warn!(error = %e, "Failed to close warehouse connection");
        }

        let mut report = result?;
        report.elapsed_ms = started.elapsed().as_millis();
        Ok(report)
    }

    async fn provision_files(
        &self,
        warehouse: &dyn Warehouse,
        credentials: &CredentialSet,
        files: &[PathBuf],
    ) -> Result<ProvisionReport> {
        let database = &credentials.database;
        let schema = &credentials.schema;

        run_step(warehouse, &create_database_sql(database), "create database").await?;
        run_step(warehouse, &use_database_sql(database), "select database").await?;
        run_step(warehouse, &create_schema_sql(schema), "create schema").await?;
        run_step(warehouse, &use_schema_sql(schema), "select schema").await?;

        let mut tables = Vec::with_capacity(files.len());
        for file in files {
            let table = self.inferencer.infer(file).map_err(|e| {
                SnowdashError::Provisioning(format!("inferring {}: {}", file.display(), e))
            })?;
            self.load_table(warehouse, &table).await?;
            tables.push(LoadedTable {
                table: table.name.clone(),
                source: file.clone(),
                columns: table.columns.len(),
            });
        }

        Ok(ProvisionReport {
            database: database.clone(),
            schema: schema.clone(),
            tables,
            elapsed_ms: 0,
        })
    }

    async fn load_table(&self, warehouse: &dyn Warehouse, table: &TableDescriptor) -> Result<()> {
        debug!(
            table = %table.name,
            columns = ?table.column_names(),
            "Inferred table schema"
        );

        run_step(warehouse, &create_table_sql(table), "create table").await?;
        run_step(warehouse, &create_stage_sql(table), "create stage").await?;

        warehouse
            .put_file(&table.source, &quote_ident(&table.stage_name()))
            .await
            .map_err(|e| {
                SnowdashError::Provisioning(format!(
                    "uploading {} to stage {}: {}",
                    table.source.display(),
                    table.stage_name(),
                    e
                ))
            })?;

        run_step(warehouse, &copy_into_sql(table), "copy into table").await?;

        info!(
            table = %table.name,
            source = %table.source.display(),
            columns = table.columns.len(),
            "Loaded table"
        );
        Ok(())
    }
}

async fn run_step(warehouse: &dyn Warehouse, sql: &str, step: &str) -> Result<()> {
    warehouse
        .execute(sql)
        .await
        .map_err(|e| SnowdashError::Provisioning(format!("{} failed: {}", step, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::RawCredentials;
    use crate::warehouse::MockConnector;
    use tempfile::TempDir;

    fn credentials() -> CredentialSet {
        RawCredentials {
            account: Some("xy1.us-east-1".to_string()),
            user: Some("alice".to_string()),
            password: Some("secret".to_string()),
            ..Default::default()
        }
        .into_credential_set()
        .unwrap()
    }

    fn data_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("sales.csv"),
            "Region,Units Sold,Price ($)\nNorth,10,2.5\nSouth,7,3\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("states.csv"),
            "State,Population (millions),Region\nKerala,35.6,South\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a table").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("inner.csv"), "a\n1\n").unwrap();
        dir
    }

    #[test]
    fn test_csv_files_lists_top_level_only() {
        let dir = data_dir();
        let files = csv_files(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["sales.csv", "states.csv"]);
    }

    #[test]
    fn test_csv_files_missing_dir() {
        assert!(matches!(
            csv_files(Path::new("/nonexistent/data")),
            Err(SnowdashError::Provisioning(_))
        ));
    }

    #[tokio::test]
    async fn test_provision_issues_statements_in_order() {
        let dir = data_dir();
        let connector = MockConnector::new();
        let provisioner = WarehouseProvisioner::new(connector.clone());

        let report = provisioner
            .provision(&credentials(), dir.path())
            .await
            .unwrap();

        assert_eq!(report.database, "INCREDIBLE_INDIA");
        assert_eq!(report.schema, "PUBLIC");
        assert_eq!(
            report.tables.iter().map(|t| t.table.as_str()).collect::<Vec<_>>(),
            vec!["SALES", "STATES"]
        );
        assert_eq!(report.tables[0].columns, 3);

        let statements = connector.statements();
        assert_eq!(statements[0], "CREATE DATABASE IF NOT EXISTS INCREDIBLE_INDIA");
        assert_eq!(statements[1], "USE DATABASE INCREDIBLE_INDIA");
        assert_eq!(statements[2], "CREATE SCHEMA IF NOT EXISTS PUBLIC");
        assert_eq!(statements[3], "USE SCHEMA PUBLIC");
        assert_eq!(
            statements[4],
            r#"CREATE TABLE IF NOT EXISTS "SALES" ("REGION" TEXT, "UNITS_SOLD" INTEGER, "PRICE_" FLOAT)"#
        );
        assert!(statements[5].starts_with(r#"CREATE OR REPLACE STAGE "SALES_STAGE""#));
        assert!(statements[6].starts_with("PUT 'file://"));
        assert!(statements[7].starts_with(r#"COPY INTO "SALES""#));
        assert!(statements[8].contains(r#""STATES""#));
        assert_eq!(statements.len(), 12);

        let uploads = connector.uploads();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].1, "\"SALES_STAGE\"");

        assert_eq!(connector.connections(), 1);
        assert_eq!(connector.closed(), 1);
    }

    #[tokio::test]
    async fn test_provision_aborts_on_failure_and_closes() {
        let dir = data_dir();
        let connector = MockConnector::new().failing_on(r#"COPY INTO "SALES""#);
        let provisioner = WarehouseProvisioner::new(connector.clone());

        let err = provisioner
            .provision(&credentials(), dir.path())
            .await
            .unwrap_err();

        match err {
            SnowdashError::Provisioning(msg) => assert!(msg.contains("copy into table")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!connector
            .statements()
            .iter()
            .any(|s| s.contains(r#""STATES""#)));
        assert_eq!(connector.closed(), 1);
    }

    #[tokio::test]
    async fn test_provision_connection_refused() {
        let dir = data_dir();
        let connector = MockConnector::new().refusing_connections();
        let provisioner = WarehouseProvisioner::new(connector.clone());

        let err = provisioner
            .provision(&credentials(), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, SnowdashError::Connection(_)));
        assert!(connector.statements().is_empty());
    }

    #[tokio::test]
    async fn test_provision_latin1_file_copies_with_its_encoding() {
        let dir = TempDir::new().unwrap();
        let mut bytes = b"Festival,Region\nDiwali,All India\n".to_vec();
        bytes.extend_from_slice(b"F\xeate,South\n");
        std::fs::write(dir.path().join("festivals.csv"), bytes).unwrap();
        let connector = MockConnector::new();

        WarehouseProvisioner::new(connector.clone())
            .provision(&credentials(), dir.path())
            .await
            .unwrap();

        let statements = connector.statements();
        let copy = statements
            .iter()
            .find(|s| s.starts_with(r#"COPY INTO "FESTIVALS""#))
            .unwrap();
        assert!(copy.ends_with("ENCODING = 'ISO-8859-1')"));
    }

    #[tokio::test]
    async fn test_provision_unnamed_index_column() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("states.csv"), ",State\n0,Kerala\n1,Punjab\n").unwrap();
        let connector = MockConnector::new();

        WarehouseProvisioner::new(connector.clone())
            .provision(&credentials(), dir.path())
            .await
            .unwrap();

        assert_eq!(
            connector.statements()[4],
            r#"CREATE TABLE IF NOT EXISTS "STATES" ("COLUMN_1" INTEGER, "STATE" TEXT)"#
        );
    }

    #[tokio::test]
    async fn test_provision_empty_dir() {
        let dir = TempDir::new().unwrap();
        let connector = MockConnector::new();
        let report = WarehouseProvisioner::new(connector.clone())
            .provision(&credentials(), dir.path())
            .await
            .unwrap();
        assert!(report.tables.is_empty());
        assert_eq!(connector.statements().len(), 4);
    }
}
