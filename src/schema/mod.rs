mod column;
mod inferencer;
mod reader;
mod table;

pub use column::{normalize_column_name, ColumnDescriptor, ColumnType};
pub use inferencer::SchemaInferencer;
pub use reader::{parse_csv, read_csv_file, CsvContents, TextEncoding};
pub use table::{table_name_for, TableDescriptor};
