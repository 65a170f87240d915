use super::column::{ColumnDescriptor, ColumnType};
use super::reader::{read_csv_file, CsvContents};
use super::table::TableDescriptor;
use crate::error::Result;
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

pub struct SchemaInferencer;

impl SchemaInferencer {
    pub fn new() -> Self {
        Self
    }

    pub fn infer(&self, path: impl AsRef<Path>) -> Result<TableDescriptor> {
        let path = path.as_ref();
        let contents = read_csv_file(path)?;
        Ok(self.infer_contents(path, &contents))
    }

    pub fn infer_contents(&self, path: &Path, contents: &CsvContents) -> TableDescriptor {
        let mut columns: Vec<ColumnDescriptor> = contents
            .headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let mut column =
                    ColumnDescriptor::new(header.clone(), ColumnType::infer(contents.column_values(idx)));
                if column.name.is_empty() {
                    column.name = format!("COLUMN_{}", idx + 1);
                }
                column
            })
            .collect();

        Self::dedupe_names(path, &mut columns);
        TableDescriptor::new(path, columns).with_encoding(contents.encoding)
    }

    /// Later columns whose normalized name is already taken get a numeric
    /// suffix (`_2`, `_3`, ...). Headers that normalize to nothing have
    /// already been named `COLUMN_<position>` at this point.
    fn dedupe_names(path: &Path, columns: &mut [ColumnDescriptor]) {
        let mut taken: HashSet<String> = HashSet::with_capacity(columns.len());

        for column in columns.iter_mut() {
            if taken.insert(column.name.clone()) {
                continue;
            }

            let mut n = 2;
            let renamed = loop {
                let candidate = format!("{}_{}", column.name, n);
                if !taken.contains(&candidate) {
                    break candidate;
                }
                n += 1;
            };

            warn!(
                file = %path.display(),
                column = %column.source_name,
                normalized = %column.name,
                renamed = %renamed,
                "Normalized column name collides with an earlier column"
            );
            taken.insert(renamed.clone());
            column.name = renamed;
        }
    }
}

impl Default for SchemaInferencer {
    fn default() -> Self {
        Self::new()
    }
}
