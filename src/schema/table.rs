use super::column::ColumnDescriptor;
use super::reader::TextEncoding;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub source: PathBuf,
    pub encoding: TextEncoding,
}

impl TableDescriptor {
    pub fn new(source: impl Into<PathBuf>, columns: Vec<ColumnDescriptor>) -> Self {
        let source = source.into();
        Self {
            name: table_name_for(&source),
            columns,
            source,
            encoding: TextEncoding::Utf8,
        }
    }

    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn stage_name(&self) -> String {
        format!("{}_STAGE", self.name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn get_column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// File stem, uppercased. `data/states.csv` becomes `STATES`.
pub fn table_name_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_uppercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_from_file_stem() {
        assert_eq!(table_name_for(Path::new("data/sales.csv")), "SALES");
        assert_eq!(
            table_name_for(Path::new("/tmp/population_growth.csv")),
            "POPULATION_GROWTH"
        );
        assert_eq!(table_name_for(Path::new("my-data.csv")), "MY-DATA");
    }

    #[test]
    fn test_stage_name() {
        let table = TableDescriptor::new("states.csv", vec![]);
        assert_eq!(table.stage_name(), "STATES_STAGE");
    }
}
