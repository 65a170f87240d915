use crate::error::{Result, SnowdashError};
use std::path::Path;
use tracing::debug;

const UTF8_BOM: &str = "\u{feff}";

/// Character encoding a CSV file was read with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Latin1,
}

impl TextEncoding {
    /// Name the warehouse's CSV file format uses for this encoding.
    pub fn as_sql(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "UTF8",
            TextEncoding::Latin1 => "ISO-8859-1",
        }
    }
}

/// Header and records of a CSV file, all cells kept as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvContents {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
    pub encoding: TextEncoding,
}

impl CsvContents {
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> {
        self.records
            .iter()
            .map(move |record| record.get(index).map(String::as_str).unwrap_or(""))
    }
}

pub fn read_csv_file(path: &Path) -> Result<CsvContents> {
    let bytes = std::fs::read(path)?;
    let text = decode_text(&bytes);
    if text.encoding == TextEncoding::Latin1 {
        debug!(path = %path.display(), "File is not valid UTF-8, decoded as Latin-1");
    }
    let mut contents = parse_csv(&text.content).map_err(|e| match e {
        SnowdashError::Schema(msg) => {
            SnowdashError::Schema(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })?;
    contents.encoding = text.encoding;
    Ok(contents)
}

pub fn parse_csv(content: &str) -> Result<CsvContents> {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(SnowdashError::Schema("missing header row".to_string()));
    }

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        records.push(record.iter().map(str::to_string).collect());
    }

    Ok(CsvContents {
        headers,
        records,
        encoding: TextEncoding::Utf8,
    })
}

struct DecodedText {
    content: String,
    encoding: TextEncoding,
}

fn decode_text(bytes: &[u8]) -> DecodedText {
    match std::str::from_utf8(bytes) {
        Ok(s) => DecodedText {
            content: s.to_string(),
            encoding: TextEncoding::Utf8,
        },
        Err(_) => DecodedText {
            content: bytes.iter().map(|&b| b as char).collect(),
            encoding: TextEncoding::Latin1,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_csv_with_quotes() {
        let contents = parse_csv("Name,Note\n\"Smith, J\",ok\nDoe,\"said \"\"hi\"\"\"\n").unwrap();
        assert_eq!(contents.headers, vec!["Name", "Note"]);
        assert_eq!(contents.records[0], vec!["Smith, J", "ok"]);
        assert_eq!(contents.records[1], vec!["Doe", "said \"hi\""]);
    }

    #[test]
    fn test_parse_csv_strips_bom() {
        let contents = parse_csv("\u{feff}Region,Units\nNorth,3\n").unwrap();
        assert_eq!(contents.headers[0], "Region");
    }

    #[test]
    fn test_parse_csv_empty_is_schema_error() {
        assert!(matches!(parse_csv(""), Err(SnowdashError::Schema(_))));
    }

    #[test]
    fn test_column_values_pads_short_records() {
        let contents = parse_csv("a,b\n1,2\n3\n").unwrap();
        let values: Vec<&str> = contents.column_values(1).collect();
        assert_eq!(values, vec!["2", ""]);
    }

    #[test]
    fn test_read_latin1_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("festivals.csv");
        let mut bytes = b"Festival,Region\nDiwali,All India\n".to_vec();
        bytes.extend_from_slice(b"F\xeate,South\n");
        std::fs::write(&path, bytes).unwrap();

        let contents = read_csv_file(&path).unwrap();
        assert_eq!(contents.records.len(), 2);
        assert_eq!(contents.records[1][0], "F\u{ea}te");
        assert_eq!(contents.encoding, TextEncoding::Latin1);
    }

    #[test]
    fn test_read_utf8_file_keeps_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("festivals.csv");
        std::fs::write(&path, "Festival\nF\u{ea}te\n").unwrap();

        let contents = read_csv_file(&path).unwrap();
        assert_eq!(contents.encoding, TextEncoding::Utf8);
        assert_eq!(contents.records[0][0], "F\u{ea}te");
    }
}
