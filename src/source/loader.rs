use super::catalog::{find_dataset, DatasetSpec, CATALOG};
use super::data_table::DataTable;
use super::fallback::FallbackProducer;
use super::session::{DataSourceMode, SessionContext};
use crate::credentials::CredentialResolver;
use crate::error::{Result, SnowdashError};
use crate::provision::sql_builder::select_all_sql;
use crate::schema::{normalize_column_name, read_csv_file};
use crate::warehouse::Connector;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Where a dataset lives in each backend.
struct DatasetLocation {
    file: String,
    table: String,
    dataset: Option<&'static DatasetSpec>,
}

impl DatasetLocation {
    fn for_name(name: &str) -> Self {
        match find_dataset(name) {
            Some(dataset) => Self {
                file: dataset.file.to_string(),
                table: dataset.table_name(),
                dataset: Some(dataset),
            },
            None => Self {
                file: format!("{}.csv", name),
                table: name.to_uppercase(),
                dataset: None,
            },
        }
    }
}

/// Fetches datasets from local CSV files or from the warehouse depending on
/// the session's data source. Never fails: a dataset that cannot be loaded
/// is replaced by the fallback rows.
pub struct DatasetLoader<C: Connector> {
    data_dir: PathBuf,
    connector: C,
    resolver: CredentialResolver,
    fallback: FallbackProducer,
}

impl<C: Connector> DatasetLoader<C> {
    pub fn new(data_dir: impl Into<PathBuf>, connector: C) -> Self {
        Self {
            data_dir: data_dir.into(),
            connector,
            resolver: CredentialResolver::new(),
            fallback: FallbackProducer::new(),
        }
    }

    pub fn with_resolver(mut self, resolver: CredentialResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub async fn load(&self, session: &SessionContext, dataset_name: &str) -> DataTable {
        match self.fetch(session.mode(), dataset_name).await {
            Ok(table) if !table.is_empty() => table,
            Ok(_) => {
                warn!(dataset = %dataset_name, mode = %session.mode(), "Dataset has no rows");
                self.fallback.on_load_failure(dataset_name)
            }
            Err(e) => {
                warn!(dataset = %dataset_name, mode = %session.mode(), error = %e, "Dataset load failed");
                self.fallback.on_load_failure(dataset_name)
            }
        }
    }

    /// Loads the named datasets, or every catalog dataset when `names` is
    /// `None`.
    pub async fn preload(
        &self,
        session: &SessionContext,
        names: Option<&[&str]>,
    ) -> HashMap<String, DataTable> {
        let names: Vec<&str> = match names {
            Some(names) => names.to_vec(),
            None => CATALOG.iter().map(|d| d.name).collect(),
        };

        let mut loaded = HashMap::with_capacity(names.len());
        for name in names {
            let table = self.load(session, name).await;
            loaded.insert(name.to_string(), table);
        }
        loaded
    }

    /// Loads a dataset without the fallback, surfacing the failure.
    pub async fn fetch(&self, mode: DataSourceMode, dataset_name: &str) -> Result<DataTable> {
        let location = DatasetLocation::for_name(dataset_name);
        let mut table = match mode {
            DataSourceMode::Local => self.fetch_local(&location),
            DataSourceMode::Remote => self.fetch_remote(&location).await,
        }
        .map_err(|e| match e {
            SnowdashError::DataLoad(_) => e,
            other => SnowdashError::DataLoad(format!("{}: {}", dataset_name, other)),
        })?;

        if let Some(dataset) = location.dataset {
            let conformance = dataset.conform(&mut table);
            if conformance.substituted {
                warn!(
                    dataset = %dataset_name,
                    missing = %conformance.missing.join(", "),
                    "Missing columns in dataset, using sample data"
                );
            } else if !conformance.missing.is_empty() {
                warn!(
                    dataset = %dataset_name,
                    missing = %conformance.missing.join(", "),
                    "Missing columns in dataset, filled with defaults"
                );
            }
            if !conformance.derived.is_empty() {
                debug!(dataset = %dataset_name, added = %conformance.derived.join(", "), "Derived columns added");
            }
        }
        Ok(table)
    }

    fn fetch_local(&self, location: &DatasetLocation) -> Result<DataTable> {
        let path = self.data_dir.join(&location.file);
        if !path.is_file() {
            return Err(SnowdashError::DataLoad(format!(
                "file not found: {}",
                path.display()
            )));
        }
        debug!(path = %path.display(), "Reading dataset from local file");
        Ok(read_csv_file(&path)?.into())
    }

    async fn fetch_remote(&self, location: &DatasetLocation) -> Result<DataTable> {
        let credentials = self.resolver.resolve_required()?;
        let warehouse = self.connector.connect(&credentials).await?;
        debug!(table = %location.table, "Reading dataset from warehouse");
        let result = warehouse.query(&select_all_sql(&location.table)).await;

        if let Err(e) = warehouse.close().await {
            warn!(error = %e, "Failed to close warehouse connection");
        }

        let mut table: DataTable = result?.into();
        if let Some(dataset) = location.dataset {
            restore_display_names(dataset, &mut table);
        }
        Ok(table)
    }
}

/// Warehouse columns carry normalized names; rename the ones that match a
/// known column back to the name the dashboard expects.
fn restore_display_names(dataset: &DatasetSpec, table: &mut DataTable) {
    for display in dataset.display_columns() {
        if table.has_column(display) {
            continue;
        }
        let normalized = normalize_column_name(display);
        table.rename_column(&normalized, display);
    }
}
