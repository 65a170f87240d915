use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result codes the service returns while a statement is still running.
pub(crate) const QUERY_IN_PROGRESS_CODES: [&str; 2] = ["333333", "333334"];

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub(crate) data: Option<T>,
    #[serde(default)]
    pub(crate) success: bool,
    pub(crate) message: Option<String>,
    pub(crate) code: Option<String>,
}

impl<T> Envelope<T> {
    pub(crate) fn is_in_progress(&self) -> bool {
        self.code
            .as_deref()
            .is_some_and(|c| QUERY_IN_PROGRESS_CODES.contains(&c))
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub(crate) data: LoginRequestData<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) struct LoginRequestData<'a> {
    pub(crate) client_app_id: &'a str,
    pub(crate) client_app_version: &'a str,
    pub(crate) account_name: &'a str,
    pub(crate) login_name: &'a str,
    pub(crate) password: &'a str,
    pub(crate) client_environment: ClientEnvironment,
    pub(crate) session_parameters: HashMap<&'a str, &'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) struct ClientEnvironment {
    pub(crate) application: String,
    pub(crate) os: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponseData {
    pub(crate) token: String,
    #[allow(dead_code)]
    pub(crate) master_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryRequest<'a> {
    pub(crate) sql_text: &'a str,
    pub(crate) async_exec: bool,
    pub(crate) sequence_id: u64,
    pub(crate) query_submission_time: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryResponseData {
    #[serde(default)]
    pub(crate) rowtype: Vec<RowType>,
    pub(crate) rowset: Option<Vec<Vec<serde_json::Value>>>,
    pub(crate) query_id: Option<String>,
    pub(crate) get_result_url: Option<String>,
    pub(crate) command: Option<String>,
    pub(crate) stage_info: Option<StageInfo>,
    pub(crate) auto_compress: Option<bool>,
    pub(crate) encryption_material: Option<serde_json::Value>,
    pub(crate) query_result_format: Option<String>,
    pub(crate) total: Option<u64>,
    #[serde(default)]
    pub(crate) chunks: Vec<ChunkInfo>,
    #[serde(default)]
    pub(crate) chunk_headers: HashMap<String, String>,
    pub(crate) qrmk: Option<String>,
}

/// A block of result rows stored outside the response, fetched by URL.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChunkInfo {
    pub(crate) url: String,
    #[serde(default)]
    pub(crate) row_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RowType {
    pub(crate) name: String,
    #[serde(rename = "type")]
    pub(crate) type_field: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StageInfo {
    pub(crate) location_type: String,
    pub(crate) location: String,
    pub(crate) region: Option<String>,
    #[serde(default)]
    pub(crate) creds: HashMap<String, String>,
    pub(crate) presigned_url: Option<String>,
    pub(crate) end_point: Option<String>,
    pub(crate) storage_account: Option<String>,
}

/// Chunk bodies are the row arrays of a JSON rowset without the enclosing
/// brackets, possibly gzipped.
pub(crate) fn parse_chunk(body: &[u8]) -> std::io::Result<Vec<Vec<serde_json::Value>>> {
    let text = if body.starts_with(&[0x1f, 0x8b]) {
        let mut decoded = String::new();
        std::io::Read::read_to_string(&mut flate2::read::GzDecoder::new(body), &mut decoded)?;
        decoded
    } else {
        String::from_utf8_lossy(body).into_owned()
    };
    let rows = serde_json::from_str(&format!("[{}]", text.trim()))?;
    Ok(rows)
}

pub(crate) fn cell_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// True when the service asks for client-side encryption of uploads.
/// Stages created with server-side encryption answer with `null` (or a list
/// of `null`s).
pub(crate) fn requires_client_encryption(material: &Option<serde_json::Value>) -> bool {
    match material {
        None | Some(serde_json::Value::Null) => false,
        Some(serde_json::Value::Array(items)) => items.iter().any(|i| !i.is_null()),
        Some(_) => true,
    }
}
