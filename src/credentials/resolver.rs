use super::types::{CredentialSet, RawCredentials};
use crate::error::{Result, SnowdashError};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const SECRETS_RELATIVE_PATH: &str = ".streamlit/secrets.toml";

const ENV_ACCOUNT: &str = "SNOWFLAKE_ACCOUNT";
const ENV_USER: &str = "SNOWFLAKE_USER";
const ENV_PASSWORD: &str = "SNOWFLAKE_PASSWORD";
const ENV_WAREHOUSE: &str = "SNOWFLAKE_WAREHOUSE";
const ENV_DATABASE: &str = "SNOWFLAKE_DATABASE";
const ENV_SCHEMA: &str = "SNOWFLAKE_SCHEMA";
const ENV_ROLE: &str = "SNOWFLAKE_ROLE";

#[derive(Debug, Default, Deserialize)]
struct SecretsFile {
    snowflake: Option<RawCredentials>,
}

enum EnvSource {
    Process,
    Fixed(HashMap<String, String>),
}

impl EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        match self {
            EnvSource::Process => std::env::var(key).ok(),
            EnvSource::Fixed(vars) => vars.get(key).cloned(),
        }
    }
}

pub struct CredentialResolver {
    secrets_paths: Vec<PathBuf>,
    env: EnvSource,
}

impl CredentialResolver {
    /// Looks in `./.streamlit/secrets.toml`, then `~/.streamlit/secrets.toml`,
    /// then the process environment.
    pub fn new() -> Self {
        let mut secrets_paths = vec![PathBuf::from(SECRETS_RELATIVE_PATH)];
        if let Some(home) = dirs::home_dir() {
            secrets_paths.push(home.join(SECRETS_RELATIVE_PATH));
        }
        Self {
            secrets_paths,
            env: EnvSource::Process,
        }
    }

    pub fn with_secrets_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.secrets_paths = vec![path.into()];
        self
    }

    pub fn with_env(mut self, vars: HashMap<String, String>) -> Self {
        self.env = EnvSource::Fixed(vars);
        self
    }

    pub fn resolve(&self) -> Option<CredentialSet> {
        if let Some(path) = self.secrets_paths.iter().find(|p| p.is_file()) {
            match Self::read_secrets_file(path) {
                Ok(raw) => {
                    if let Some(creds) = raw.into_credential_set() {
                        debug!(path = %path.display(), "Resolved credentials from secrets file");
                        return Some(creds);
                    }
                    debug!(
                        path = %path.display(),
                        "Secrets file lacks account, user or password; trying environment"
                    );
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring unreadable secrets file");
                }
            }
        }

        let creds = self.read_env().into_credential_set();
        if creds.is_some() {
            debug!("Resolved credentials from environment");
        }
        creds
    }

    pub fn resolve_required(&self) -> Result<CredentialSet> {
        self.resolve().ok_or(SnowdashError::CredentialsAbsent)
    }

    fn read_secrets_file(path: &Path) -> Result<RawCredentials> {
        let content = std::fs::read_to_string(path)?;
        parse_secrets(&content)
    }

    fn read_env(&self) -> RawCredentials {
        RawCredentials {
            account: self.env.get(ENV_ACCOUNT),
            user: self.env.get(ENV_USER),
            password: self.env.get(ENV_PASSWORD),
            warehouse: self.env.get(ENV_WAREHOUSE),
            database: self.env.get(ENV_DATABASE),
            schema: self.env.get(ENV_SCHEMA),
            role: self.env.get(ENV_ROLE),
        }
    }
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts the `[snowflake]` table of a secrets file. A file without that
/// table yields empty credentials rather than an error.
pub fn parse_secrets(content: &str) -> Result<RawCredentials> {
    let secrets: SecretsFile = toml::from_str(content)?;
    Ok(secrets.snowflake.unwrap_or_default())
}
