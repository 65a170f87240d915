use std::fmt;

pub const DEFAULT_WAREHOUSE: &str = "COMPUTE_WH";
pub const DEFAULT_DATABASE: &str = "INCREDIBLE_INDIA";
pub const DEFAULT_SCHEMA: &str = "PUBLIC";
pub const DEFAULT_ROLE: &str = "ACCOUNTADMIN";

#[derive(Clone, PartialEq, Eq)]
pub struct CredentialSet {
    pub account: String,
    pub user: String,
    pub password: String,
    pub warehouse: String,
    pub database: String,
    pub schema: String,
    pub role: String,
}

impl CredentialSet {
    /// Account locator without the region/cloud suffix, e.g. `xy1` for
    /// `xy1.us-east-1`.
    pub fn account_locator(&self) -> &str {
        self.account.split('.').next().unwrap_or(&self.account)
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &"***")
            .field("warehouse", &self.warehouse)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("role", &self.role)
            .finish()
    }
}

/// The seven fields as found in one source, before the all-or-nothing rule
/// is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct RawCredentials {
    pub account: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub warehouse: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub role: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl RawCredentials {
    pub fn into_credential_set(self) -> Option<CredentialSet> {
        let account = present(self.account)?;
        let user = present(self.user)?;
        let password = present(self.password)?;

        Some(CredentialSet {
            account,
            user,
            password,
            warehouse: present(self.warehouse).unwrap_or_else(|| DEFAULT_WAREHOUSE.to_string()),
            database: present(self.database).unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            schema: present(self.schema).unwrap_or_else(|| DEFAULT_SCHEMA.to_string()),
            role: present(self.role).unwrap_or_else(|| DEFAULT_ROLE.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mandatory() -> RawCredentials {
        RawCredentials {
            account: Some("xy1.us-east-1".to_string()),
            user: Some("alice".to_string()),
            password: Some("secret".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_fill_optional_fields() {
        let creds = mandatory().into_credential_set().unwrap();
        assert_eq!(creds.warehouse, DEFAULT_WAREHOUSE);
        assert_eq!(creds.database, DEFAULT_DATABASE);
        assert_eq!(creds.schema, DEFAULT_SCHEMA);
        assert_eq!(creds.role, DEFAULT_ROLE);
    }

    #[test]
    fn test_blank_mandatory_field_is_absent() {
        let raw = RawCredentials {
            password: Some("  ".to_string()),
            ..mandatory()
        };
        assert!(raw.into_credential_set().is_none());
    }

    #[test]
    fn test_account_locator() {
        let creds = mandatory().into_credential_set().unwrap();
        assert_eq!(creds.account_locator(), "xy1");
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = mandatory().into_credential_set().unwrap();
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("alice"));
    }
}
