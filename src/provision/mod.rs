mod provisioner;
pub(crate) mod sql_builder;

pub use provisioner::{csv_files, LoadedTable, ProvisionReport, WarehouseProvisioner};
