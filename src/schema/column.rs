use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static DISALLOWED_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("disallowed chars regex is valid"));

const MAX_INTEGER_DIGITS: usize = 38;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Integer,
    Float,
    Text,
}

impl ColumnType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "FLOAT",
            ColumnType::Text => "TEXT",
        }
    }

    /// Classifies a column from its raw cell values. Empty cells carry no
    /// type information and are skipped; a column without any value is TEXT.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a str>) -> ColumnType {
        let mut inferred: Option<ColumnType> = None;

        for value in values {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let kind = Self::classify_value(value);
            inferred = Some(match (inferred, kind) {
                (_, ColumnType::Text) => return ColumnType::Text,
                (Some(ColumnType::Float), _) | (_, ColumnType::Float) => ColumnType::Float,
                _ => ColumnType::Integer,
            });
        }

        inferred.unwrap_or(ColumnType::Text)
    }

    fn classify_value(value: &str) -> ColumnType {
        // INTEGER is NUMBER(38,0) in the warehouse, wider than i64.
        let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
        if !digits.is_empty()
            && digits.len() <= MAX_INTEGER_DIGITS
            && digits.bytes().all(|b| b.is_ascii_digit())
        {
            return ColumnType::Integer;
        }
        match value.parse::<f64>() {
            Ok(f) if f.is_finite() => ColumnType::Float,
            _ => ColumnType::Text,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub column_type: ColumnType,
    pub source_name: String,
}

impl ColumnDescriptor {
    pub fn new(source_name: impl Into<String>, column_type: ColumnType) -> Self {
        let source_name = source_name.into();
        Self {
            name: normalize_column_name(&source_name),
            column_type,
            source_name,
        }
    }
}

/// Turns a CSV header into a warehouse identifier: spaces become
/// underscores, parentheses are dropped, `%` becomes `PCT`, anything else
/// outside `[A-Za-z0-9_]` is removed and the result is uppercased.
pub fn normalize_column_name(name: &str) -> String {
    let replaced = name
        .trim()
        .replace(' ', "_")
        .replace(['(', ')'], "")
        .replace('%', "PCT");
    DISALLOWED_CHARS
        .replace_all(&replaced, "")
        .to_ascii_uppercase()
}
