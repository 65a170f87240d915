use clap::Parser;
use colored::Colorize;
use snowdash::credentials::CredentialResolver;
use snowdash::probe::ProbeResult;
use snowdash::provision::ProvisionReport;
use snowdash::warehouse::SnowflakeConnector;
use snowdash::workflow::{run, Action, Step};
use std::path::PathBuf;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "snowdash")]
#[command(about = "Provision Snowflake tables from dashboard CSV files and check connectivity")]
#[command(version)]
struct Cli {
    /// Only test the Snowflake connection
    #[arg(long, conflicts_with = "setup")]
    test: bool,

    /// Only create the warehouse objects and load the CSV files
    #[arg(long)]
    setup: bool,

    /// Secrets file with a [snowflake] section
    #[arg(long, env = "SNOWDASH_SECRETS")]
    secrets: Option<PathBuf>,

    /// Directory holding the CSV files to load
    #[arg(long, env = "SNOWDASH_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Tabled)]
struct TableRow {
    #[tabled(rename = "Table")]
    table: String,
    #[tabled(rename = "Columns")]
    columns: usize,
    #[tabled(rename = "Source")]
    source: String,
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "snowdash=debug" } else { "snowdash=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn print_probe(result: &ProbeResult) {
    println!("{} Connected to Snowflake {}", "✓".green(), result.version.bold());
    if result.tables.is_empty() {
        println!("  No tables yet");
    } else {
        println!("  Tables: {}", result.tables.join(", "));
    }
}

fn print_report(report: &ProvisionReport) {
    println!(
        "{} Loaded {} table(s) into {}.{} in {} ms",
        "✓".green(),
        report.tables.len(),
        report.database,
        report.schema,
        report.elapsed_ms
    );
    if report.tables.is_empty() {
        return;
    }
    let rows: Vec<TableRow> = report
        .tables
        .iter()
        .map(|t| TableRow {
            table: t.table.clone(),
            columns: t.columns,
            source: t.source.display().to_string(),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let resolver = match &cli.secrets {
        Some(path) => CredentialResolver::new().with_secrets_path(path),
        None => CredentialResolver::new(),
    };
    let action = Action::from_flags(cli.test, cli.setup);

    match action {
        Action::Test => println!("{}", "Testing Snowflake connection...".cyan()),
        Action::Setup => println!(
            "{} {}",
            "Setting up Snowflake from".cyan(),
            cli.data_dir.display()
        ),
        Action::Both => println!(
            "{} {}",
            "Testing Snowflake connection and setting up from".cyan(),
            cli.data_dir.display()
        ),
    }

    let outcome = run(action, &resolver, SnowflakeConnector::new(), &cli.data_dir).await;

    match &outcome.probe {
        Step::Done(result) => print_probe(result),
        Step::Failed => println!("{} Connection test failed", "✗".red()),
        Step::Skipped => {}
    }
    match &outcome.setup {
        Step::Done(report) => print_report(report),
        Step::Failed => println!("{} Setup failed", "✗".red()),
        Step::Skipped if outcome.probe.is_failed() => {
            println!("  Setup skipped, fix the connection first")
        }
        Step::Skipped => {}
    }
}
