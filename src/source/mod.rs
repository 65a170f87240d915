mod catalog;
mod data_table;
mod fallback;
mod loader;
mod manager;
mod session;

pub use catalog::{
    find_dataset, ColumnDefault, Conformance, DatasetSpec, DerivedColumn, SampleTable, CATALOG,
};
pub use data_table::DataTable;
pub use fallback::{default_rows, FallbackProducer};
pub use loader::DatasetLoader;
pub use manager::SessionManager;
pub use session::{DataSourceMode, SessionContext};
