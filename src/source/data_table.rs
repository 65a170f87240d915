use crate::schema::CsvContents;
use crate::warehouse::QueryResult;

/// Rows handed to the dashboard, every cell kept as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }

    /// Appends a column; `value_at` receives the row index.
    pub fn push_column(&mut self, name: impl Into<String>, value_at: impl Fn(usize) -> String) {
        let width = self.columns.len();
        self.columns.push(name.into());
        for (i, row) in self.rows.iter_mut().enumerate() {
            row.resize(width, String::new());
            row.push(value_at(i));
        }
    }

    pub fn rename_column(&mut self, from: &str, to: impl Into<String>) -> bool {
        match self.column_index(from) {
            Some(idx) => {
                self.columns[idx] = to.into();
                true
            }
            None => false,
        }
    }
}

impl From<CsvContents> for DataTable {
    fn from(contents: CsvContents) -> Self {
        Self::new(contents.headers, contents.records)
    }
}

impl From<QueryResult> for DataTable {
    fn from(result: QueryResult) -> Self {
        let columns = result.column_names();
        Self::new(columns, result.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DataTable {
        DataTable::new(
            vec!["State".to_string(), "Region".to_string()],
            vec![
                vec!["Kerala".to_string(), "South".to_string()],
                vec!["Punjab".to_string()],
            ],
        )
    }

    #[test]
    fn test_column_values() {
        assert_eq!(table().column("Region"), Some(vec!["South", ""]));
        assert_eq!(table().column("Missing"), None);
    }

    #[test]
    fn test_push_column_pads_short_rows() {
        let mut t = table();
        t.push_column("Rank", |i| (i + 1).to_string());
        assert_eq!(t.columns.len(), 3);
        assert_eq!(t.rows[1], vec!["Punjab", "", "2"]);
    }

    #[test]
    fn test_rename_column() {
        let mut t = table();
        assert!(t.rename_column("Region", "Zone"));
        assert!(t.has_column("Zone"));
        assert!(!t.rename_column("Region", "Zone"));
    }
}
