//! Operation boundaries for the setup script. Every failure is logged with
//! its cause and turned into `None`; nothing here propagates an error.

use crate::credentials::CredentialResolver;
use crate::error::SnowdashError;
use crate::probe::{ConnectivityProber, ProbeResult};
use crate::provision::{ProvisionReport, WarehouseProvisioner};
use crate::warehouse::Connector;
use std::path::Path;
use tracing::{error, info};

/// What a setup run does: probe only, provision only, or probe and then
/// provision when the probe succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Test,
    Setup,
    Both,
}

impl Action {
    pub fn from_flags(test: bool, setup: bool) -> Self {
        match (test, setup) {
            (true, false) => Action::Test,
            (false, true) => Action::Setup,
            _ => Action::Both,
        }
    }

    fn runs_probe(self) -> bool {
        matches!(self, Action::Test | Action::Both)
    }

    fn runs_setup(self) -> bool {
        matches!(self, Action::Setup | Action::Both)
    }
}

#[derive(Debug)]
pub enum Step<T> {
    Skipped,
    Failed,
    Done(T),
}

impl<T> Step<T> {
    fn from_option(value: Option<T>) -> Self {
        value.map_or(Step::Failed, Step::Done)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Step::Failed)
    }
}

#[derive(Debug)]
pub struct RunOutcome {
    pub probe: Step<ProbeResult>,
    pub setup: Step<ProvisionReport>,
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        !self.probe.is_failed() && !self.setup.is_failed()
    }
}

/// Runs the requested steps in order. A failed probe skips provisioning.
pub async fn run<C: Connector + Clone>(
    action: Action,
    resolver: &CredentialResolver,
    connector: C,
    data_dir: &Path,
) -> RunOutcome {
    let probe = if action.runs_probe() {
        Step::from_option(test_connection(resolver, connector.clone()).await)
    } else {
        Step::Skipped
    };

    let setup = if !action.runs_setup() {
        Step::Skipped
    } else if probe.is_failed() {
        info!("Skipping warehouse setup after failed connection test");
        Step::Skipped
    } else {
        Step::from_option(setup_warehouse(resolver, connector, data_dir).await)
    };

    RunOutcome { probe, setup }
}

pub async fn test_connection<C: Connector>(
    resolver: &CredentialResolver,
    connector: C,
) -> Option<ProbeResult> {
    let credentials = match resolver.resolve_required() {
        Ok(creds) => creds,
        Err(e) => {
            report_failure("connection test", &e);
            return None;
        }
    };

    match ConnectivityProber::new(connector).probe(&credentials).await {
        Ok(result) => Some(result),
        Err(e) => {
            report_failure("connection test", &e);
            None
        }
    }
}

pub async fn setup_warehouse<C: Connector>(
    resolver: &CredentialResolver,
    connector: C,
    data_dir: &Path,
) -> Option<ProvisionReport> {
    let credentials = match resolver.resolve_required() {
        Ok(creds) => creds,
        Err(e) => {
            report_failure("warehouse setup", &e);
            return None;
        }
    };

    match WarehouseProvisioner::new(connector)
        .provision(&credentials, data_dir)
        .await
    {
        Ok(report) => Some(report),
        Err(e) => {
            report_failure("warehouse setup", &e);
            None
        }
    }
}

fn report_failure(operation: &str, err: &SnowdashError) {
    match err {
        SnowdashError::CredentialsAbsent => error!(
            operation = %operation,
            "No Snowflake credentials found; add a [snowflake] section to .streamlit/secrets.toml or set SNOWFLAKE_ACCOUNT, SNOWFLAKE_USER and SNOWFLAKE_PASSWORD"
        ),
        e if e.is_remote() => error!(operation = %operation, error = %e, "Snowflake request failed"),
        e => error!(operation = %operation, error = %e, "Operation failed"),
    }
}
