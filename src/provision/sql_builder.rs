use crate::schema::{TableDescriptor, TextEncoding};

pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub(crate) fn stage_ref(table: &TableDescriptor) -> String {
    format!("@{}", quote_ident(&table.stage_name()))
}

pub(crate) fn create_database_sql(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {}", database)
}

pub(crate) fn use_database_sql(database: &str) -> String {
    format!("USE DATABASE {}", database)
}

pub(crate) fn create_schema_sql(schema: &str) -> String {
    format!("CREATE SCHEMA IF NOT EXISTS {}", schema)
}

pub(crate) fn use_schema_sql(schema: &str) -> String {
    format!("USE SCHEMA {}", schema)
}

pub(crate) fn create_table_sql(table: &TableDescriptor) -> String {
    let columns = table
        .columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.column_type.as_sql()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "CREATE TABLE IF NOT EXISTS {table} ({columns})",
        table = quote_ident(&table.name),
        columns = columns,
    )
}

pub(crate) fn create_stage_sql(table: &TableDescriptor) -> String {
    format!(
        "CREATE OR REPLACE STAGE {} ENCRYPTION = (TYPE = 'SNOWFLAKE_SSE')",
        quote_ident(&table.stage_name())
    )
}

/// The staged file holds the raw bytes, so a file read as Latin-1 has to be
/// loaded with the same encoding.
pub(crate) fn copy_into_sql(table: &TableDescriptor) -> String {
    let encoding = match table.encoding {
        TextEncoding::Utf8 => String::new(),
        other => format!(" ENCODING = '{}'", other.as_sql()),
    };
    format!(
        r#"COPY INTO {table} FROM {stage} FILE_FORMAT = (TYPE = 'CSV' SKIP_HEADER = 1 FIELD_OPTIONALLY_ENCLOSED_BY = '"'{encoding})"#,
        table = quote_ident(&table.name),
        stage = stage_ref(table),
        encoding = encoding,
    )
}

pub(crate) fn select_all_sql(table_name: &str) -> String {
    format!("SELECT * FROM {}", quote_ident(table_name))
}
