mod resolver;
mod types;

pub use resolver::{parse_secrets, CredentialResolver, SECRETS_RELATIVE_PATH};
pub use types::{
    CredentialSet, RawCredentials, DEFAULT_DATABASE, DEFAULT_ROLE, DEFAULT_SCHEMA,
    DEFAULT_WAREHOUSE,
};
