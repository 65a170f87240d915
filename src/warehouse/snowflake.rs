use super::protocol::{
    cell_to_string, parse_chunk, requires_client_encryption, ChunkInfo, ClientEnvironment,
    Envelope, LoginRequest, LoginRequestData, LoginResponseData, QueryRequest, QueryResponseData,
};
use super::stage::StageUploader;
use super::{ColumnInfo, Connector, QueryResult, Warehouse};
use crate::credentials::CredentialSet;
use crate::error::{Result, SnowdashError};
use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

// Login requires the id and version of a driver the service recognizes.
// This one defaults to Arrow results, so the session asks for JSON.
const CLIENT_APP_ID: &str = "Go";
const CLIENT_APP_VERSION: &str = "1.6.22";
const RESULT_FORMAT: &str = "JSON";

const SSE_C_ALGORITHM_HEADER: &str = "x-amz-server-side-encryption-customer-algorithm";
const SSE_C_KEY_HEADER: &str = "x-amz-server-side-encryption-customer-key";

const RESULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const MAX_RESULT_POLLS: usize = 1200;

pub fn default_base_url(account: &str) -> String {
    format!("https://{}.snowflakecomputing.com", account)
}

/// Opens password-authenticated sessions against Snowflake's REST endpoints.
#[derive(Debug, Clone, Default)]
pub struct SnowflakeConnector {
    base_url: Option<String>,
}

impl SnowflakeConnector {
    pub fn new() -> Self {
        Self { base_url: None }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

#[async_trait]
impl Connector for SnowflakeConnector {
    async fn connect(&self, credentials: &CredentialSet) -> Result<Box<dyn Warehouse>> {
        let base_url = self
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(&credentials.account));
        let client = SnowflakeClient::login(base_url, credentials).await?;
        Ok(Box::new(client))
    }
}

pub struct SnowflakeClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    sequence: AtomicU64,
}

impl SnowflakeClient {
    pub async fn login(base_url: impl Into<String>, credentials: &CredentialSet) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let request = LoginRequest {
            data: LoginRequestData {
                client_app_id: CLIENT_APP_ID,
                client_app_version: CLIENT_APP_VERSION,
                account_name: credentials.account_locator(),
                login_name: &credentials.user,
                password: &credentials.password,
                client_environment: ClientEnvironment {
                    application: env!("CARGO_PKG_NAME").to_string(),
                    os: std::env::consts::OS.to_string(),
                },
                session_parameters: HashMap::from([("QUERY_RESULT_FORMAT", RESULT_FORMAT)]),
            },
        };

        let url = format!("{}/session/v1/login-request", base_url);
        let response = http
            .post(url)
            .query(&[
                ("warehouse", credentials.warehouse.as_str()),
                ("databaseName", credentials.database.as_str()),
                ("schemaName", credentials.schema.as_str()),
                ("roleName", credentials.role.as_str()),
            ])
            .header(ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| SnowdashError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SnowdashError::Connection(format!(
                "login request returned HTTP {}",
                status
            )));
        }

        let envelope: Envelope<LoginResponseData> = response
            .json()
            .await
            .map_err(|e| SnowdashError::Connection(e.to_string()))?;
        let token = match envelope.data {
            Some(data) if envelope.success => data.token,
            _ => {
                return Err(SnowdashError::Connection(format!(
                    "login failed: {}",
                    envelope
                        .message
                        .unwrap_or_else(|| "no message from service".to_string())
                )))
            }
        };

        info!(account = %credentials.account, user = %credentials.user, "Connected to Snowflake");
        Ok(Self {
            http,
            base_url,
            token,
            sequence: AtomicU64::new(1),
        })
    }

    fn session_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::with_capacity(3);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/snowflake"));
        let auth = HeaderValue::from_str(&format!("Snowflake Token=\"{}\"", self.token))
            .map_err(|e| SnowdashError::Connection(format!("invalid session token: {}", e)))?;
        headers.insert(AUTHORIZATION, auth);
        Ok(headers)
    }

    async fn run_statement(&self, sql: &str) -> Result<QueryResponseData> {
        debug!(sql = %sql, "Executing statement");
        let request = QueryRequest {
            sql_text: sql,
            async_exec: false,
            sequence_id: self.sequence.fetch_add(1, Ordering::SeqCst),
            query_submission_time: chrono::Utc::now().timestamp_millis(),
        };
        let url = format!(
            "{}/queries/v1/query-request?requestId={}",
            self.base_url,
            uuid::Uuid::new_v4()
        );

        let mut envelope: Envelope<QueryResponseData> = self
            .http
            .post(url)
            .headers(self.session_headers()?)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut polls = 0;
        while envelope.is_in_progress() {
            let result_url = envelope
                .data
                .as_ref()
                .and_then(|d| d.get_result_url.clone())
                .ok_or_else(|| SnowdashError::Query {
                    code: envelope.code.clone().unwrap_or_default(),
                    message: "statement still running but no result URL was returned".to_string(),
                })?;
            polls += 1;
            if polls > MAX_RESULT_POLLS {
                return Err(SnowdashError::Query {
                    code: envelope.code.clone().unwrap_or_default(),
                    message: "gave up waiting for statement result".to_string(),
                });
            }
            tokio::time::sleep(RESULT_POLL_INTERVAL).await;
            envelope = self
                .http
                .get(format!("{}{}", self.base_url, result_url))
                .headers(self.session_headers()?)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
        }

        if !envelope.success {
            return Err(SnowdashError::Query {
                code: envelope.code.unwrap_or_default(),
                message: envelope
                    .message
                    .unwrap_or_else(|| "statement failed".to_string()),
            });
        }

        let data = envelope.data.unwrap_or_default();
        if let Some(query_id) = &data.query_id {
            debug!(query_id = %query_id, "Statement finished");
        }
        Ok(data)
    }

    /// Downloads one result chunk. Chunks live in cloud storage and take the
    /// headers the service handed out with the result, not the session token.
    async fn fetch_chunk(
        &self,
        chunk: &ChunkInfo,
        data: &QueryResponseData,
    ) -> Result<Vec<Vec<serde_json::Value>>> {
        let mut request = self.http.get(&chunk.url);
        if !data.chunk_headers.is_empty() {
            for (name, value) in &data.chunk_headers {
                request = request.header(name.as_str(), value.as_str());
            }
        } else if let Some(qrmk) = &data.qrmk {
            request = request
                .header(SSE_C_ALGORITHM_HEADER, "AES256")
                .header(SSE_C_KEY_HEADER, qrmk.as_str());
        }

        let body = request.send().await?.error_for_status()?.bytes().await?;
        let rows = parse_chunk(&body).map_err(|e| SnowdashError::Query {
            code: String::new(),
            message: format!("unreadable result chunk: {}", e),
        })?;
        debug!(rows = rows.len(), expected = chunk.row_count, "Fetched result chunk");
        Ok(rows)
    }
}

#[async_trait]
impl Warehouse for SnowflakeClient {
    async fn execute(&self, sql: &str) -> Result<()> {
        self.run_statement(sql).await.map(|_| ())
    }

    async fn query(&self, sql: &str) -> Result<QueryResult> {
        let mut data = self.run_statement(sql).await?;
        if let Some(format) = data
            .query_result_format
            .as_deref()
            .filter(|f| !f.eq_ignore_ascii_case(RESULT_FORMAT))
        {
            return Err(SnowdashError::Query {
                code: String::new(),
                message: format!("unsupported result format '{}'", format),
            });
        }

        let columns = data
            .rowtype
            .iter()
            .map(|r| ColumnInfo {
                name: r.name.clone(),
                column_type: r.type_field.clone(),
            })
            .collect();
        let mut rowset = data.rowset.take().unwrap_or_default();
        for chunk in &data.chunks {
            rowset.extend(self.fetch_chunk(chunk, &data).await?);
        }

        if let Some(total) = data.total.filter(|&t| (rowset.len() as u64) < t) {
            return Err(SnowdashError::Query {
                code: String::new(),
                message: format!("result truncated: received {} of {} rows", rowset.len(), total),
            });
        }

        let rows = rowset
            .iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();
        Ok(QueryResult { columns, rows })
    }

    async fn put_file(&self, local: &Path, stage: &str) -> Result<()> {
        let absolute = std::fs::canonicalize(local)?;
        let file_name = absolute
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                SnowdashError::StageUpload(format!("{} has no file name", local.display()))
            })?;
        let sql = put_statement(&absolute, stage);

        let data = self.run_statement(&sql).await?;
        if data.command.as_deref().is_some_and(|c| c != "UPLOAD") {
            return Err(SnowdashError::StageUpload(format!(
                "unexpected transfer command {:?}",
                data.command
            )));
        }
        if requires_client_encryption(&data.encryption_material) {
            return Err(SnowdashError::StageUpload(format!(
                "stage {} requires client-side encryption; recreate it with ENCRYPTION = (TYPE = 'SNOWFLAKE_SSE')",
                stage
            )));
        }
        let stage_info = data.stage_info.ok_or_else(|| {
            SnowdashError::StageUpload("service did not return stage location".to_string())
        })?;

        let raw = std::fs::read(&absolute)?;
        let (upload_name, body) = if data.auto_compress.unwrap_or(true) {
            (format!("{}.gz", file_name), gzip(&raw)?)
        } else {
            (file_name, raw)
        };

        StageUploader::new(&self.http)
            .upload(&stage_info, &upload_name, body)
            .await
    }

    async fn close(&self) -> Result<()> {
        let response = self
            .http
            .post(format!("{}/session?delete=true", self.base_url))
            .headers(self.session_headers()?)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SnowdashError::Connection(format!(
                "closing session returned HTTP {}",
                response.status()
            )));
        }
        debug!("Snowflake session closed");
        Ok(())
    }
}

pub(crate) fn put_statement(absolute: &Path, stage: &str) -> String {
    let path = absolute.to_string_lossy().replace('\\', "/").replace('\'', "\\'");
    format!(
        "PUT 'file://{}' @{} AUTO_COMPRESS=TRUE OVERWRITE=TRUE",
        path, stage
    )
}

fn gzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}
