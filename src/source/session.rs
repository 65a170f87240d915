use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceMode {
    #[default]
    Local,
    Remote,
}

impl fmt::Display for DataSourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceMode::Local => f.write_str("local"),
            DataSourceMode::Remote => f.write_str("remote"),
        }
    }
}

impl FromStr for DataSourceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" | "csv" => Ok(DataSourceMode::Local),
            "remote" | "snowflake" => Ok(DataSourceMode::Remote),
            other => Err(format!("unknown data source '{}'", other)),
        }
    }
}

/// Per-session state consulted by every data fetch. Starts in
/// [`DataSourceMode::Local`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    id: Uuid,
    mode: DataSourceMode,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            mode: DataSourceMode::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> DataSourceMode {
        self.mode
    }

    /// The user's explicit choice of data source.
    pub fn select_mode(&mut self, mode: DataSourceMode) {
        if self.mode != mode {
            info!(session = %self.id, from = %self.mode, to = %mode, "Data source switched");
        }
        self.mode = mode;
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_local() {
        assert_eq!(SessionContext::new().mode(), DataSourceMode::Local);
    }

    #[test]
    fn test_select_mode() {
        let mut session = SessionContext::new();
        session.select_mode(DataSourceMode::Remote);
        assert_eq!(session.mode(), DataSourceMode::Remote);
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("Snowflake".parse::<DataSourceMode>(), Ok(DataSourceMode::Remote));
        assert_eq!("local".parse::<DataSourceMode>(), Ok(DataSourceMode::Local));
        assert!("ftp".parse::<DataSourceMode>().is_err());
    }
}
