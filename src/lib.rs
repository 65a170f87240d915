pub mod credentials;
pub mod error;
pub mod probe;
pub mod provision;
pub mod schema;
pub mod source;
pub mod warehouse;
pub mod workflow;

pub use credentials::{CredentialResolver, CredentialSet, RawCredentials};
pub use error::{Result, SnowdashError};
pub use probe::{ConnectivityProber, ProbeResult};
pub use provision::{LoadedTable, ProvisionReport, WarehouseProvisioner};
pub use schema::{
    normalize_column_name, ColumnDescriptor, ColumnType, SchemaInferencer, TableDescriptor,
};
pub use source::{
    DataSourceMode, DataTable, DatasetLoader, FallbackProducer, SessionContext, SessionManager,
};
pub use warehouse::{
    ColumnInfo, Connector, MockConnector, QueryResult, SnowflakeClient, SnowflakeConnector,
    Warehouse,
};
