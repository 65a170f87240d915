use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnowdashError {
    #[error("No complete Snowflake credentials found (account, user and password are required)")]
    CredentialsAbsent,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Snowflake error {code}: {message}")]
    Query { code: String, message: String },

    #[error("Provisioning error: {0}")]
    Provisioning(String),

    #[error("Stage upload error: {0}")]
    StageUpload(String),

    #[error("Data load error: {0}")]
    DataLoad(String),

    #[error("Schema inference error: {0}")]
    Schema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Secrets file parse error: {0}")]
    SecretsParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl SnowdashError {
    /// Errors raised while talking to the warehouse, as opposed to local
    /// file or configuration problems.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            SnowdashError::Connection(_)
                | SnowdashError::Query { .. }
                | SnowdashError::StageUpload(_)
                | SnowdashError::Http(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SnowdashError>;
