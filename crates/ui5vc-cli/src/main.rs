//! ui5vc - UI5 Version Check CLI
//!
//! Checks the UI5 version declared in `manifest.json` files against the
//! public version overview and optionally updates outdated versions.
//!
//! ## Commands
//!
//! - `check`: Validate (and fix) the versions of all manifests below a path
//! - `validate`: Validate bare version strings
//! - `latest`: Show the version outdated manifests would be updated to
//! - `version`: Print the tool version

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};

use ui5_version_feed::{FeedClient, FeedConfig};
use ui5vc_core::{
    discover_manifests, fetch_and_validate, fetch_latest_version, render_summary_md,
    write_summary_json, write_summary_md, CatalogueSource, CheckOptions, CheckSummary,
    ValidationOptions, VersionCheck,
    DEFAULT_ALLOWED_DAYS_BEFORE_EOCP, MESSAGE_SEPARATOR,
};

#[derive(Parser)]
#[command(name = "ui5vc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Checks the validity of UI5 versions in manifest files", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output and JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// URL of the UI5 version overview
    #[arg(long, global = true, env = "UI5VC_OVERVIEW_URL")]
    overview_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the UI5 versions of all manifests below a base path
    #[command(visible_alias = "c")]
    Check(CheckArgs),

    /// Validate one or more UI5 versions
    Validate {
        /// Versions to validate (e.g. 1.120.* or 1.120.4)
        #[arg(required = true)]
        versions: Vec<String>,

        /// Allowed number of days before the end of the EOCP quarter
        #[arg(long, default_value_t = DEFAULT_ALLOWED_DAYS_BEFORE_EOCP, env = "UI5VC_ALLOWED_DAYS_BEFORE_EOCP")]
        allowed_days_before_eocp: i64,

        /// Treat end of maintenance as an error instead of a warning
        #[arg(long)]
        eom_not_allowed: bool,
    },

    /// Show the version outdated manifests would be updated to
    Latest {
        /// Only consider long term support versions
        #[arg(long)]
        lts: bool,
    },

    /// Print the tool version
    Version,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Check(_) => "check",
            Commands::Validate { .. } => "validate",
            Commands::Latest { .. } => "latest",
            Commands::Version => "version",
        }
    }
}

#[derive(Args, Debug, Clone)]
struct CheckArgs {
    /// Base path to start from
    #[arg(short = 'p', long, env = "UI5VC_BASE_PATH")]
    base_path: PathBuf,

    /// Paths to manifest.json files, relative to the base path (glob patterns)
    #[arg(short = 'm', long, num_args = 1..)]
    manifest_paths: Vec<String>,

    /// Allowed number of days before the end of the EOCP quarter (e.g. Q1/2024)
    #[arg(long, default_value_t = DEFAULT_ALLOWED_DAYS_BEFORE_EOCP, env = "UI5VC_ALLOWED_DAYS_BEFORE_EOCP")]
    allowed_days_before_eocp: i64,

    /// Fix outdated versions automatically
    #[arg(short, long)]
    fix: bool,

    /// Update outdated versions to the latest LTS version
    #[arg(long = "use-lts", env = "UI5VC_USE_LTS")]
    use_lts: bool,

    /// Versions that only reached end of maintenance produce warnings
    #[arg(long, env = "UI5VC_EOM_ALLOWED")]
    eom_allowed: bool,

    /// Also write the summary as JSON to this file
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Also write the summary table as markdown to this file
    #[arg(long)]
    summary_md: Option<PathBuf>,
}

impl CheckArgs {
    fn options(&self) -> CheckOptions {
        CheckOptions {
            allowed_days_before_eocp: self.allowed_days_before_eocp,
            use_lts: self.use_lts,
            eom_allowed: self.eom_allowed,
            fix_outdated: self.fix,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    ui5vc_core::init_tracing(cli.json, level);

    let name = cli.command.name();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error during executing command '{}'", name);
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Dispatch a parsed command. `Ok(false)` means "completed, but failed".
async fn run(cli: Cli) -> Result<bool> {
    if let Commands::Version = cli.command {
        println!("v{}", ui5vc_core::VERSION);
        return Ok(true);
    }

    let config = match &cli.overview_url {
        Some(url) => FeedConfig::new(url),
        None => FeedConfig::from_env(),
    };
    let client = FeedClient::new(config).context("Failed to create version feed client")?;
    let now = Utc::now();

    match cli.command {
        Commands::Check(args) => cmd_check(&client, &args, cli.json, now).await,
        Commands::Validate {
            versions,
            allowed_days_before_eocp,
            eom_not_allowed,
        } => {
            let options = ValidationOptions {
                allowed_days_before_eocp,
                eom_allowed: !eom_not_allowed,
            };
            cmd_validate(&client, &versions, options, cli.json, now).await
        }
        Commands::Latest { lts } => cmd_latest(&client, lts, cli.json, now).await,
        Commands::Version => Ok(true),
    }
}

/// Check all manifests below the base path.
async fn cmd_check(
    source: &dyn CatalogueSource,
    args: &CheckArgs,
    json: bool,
    now: DateTime<Utc>,
) -> Result<bool> {
    let base = std::fs::canonicalize(&args.base_path)
        .with_context(|| format!("Base path {:?} not found", args.base_path))?;
    let manifests = discover_manifests(&base, &args.manifest_paths)
        .context("Failed to locate manifest files")?;
    info!(base = ?base, manifests = manifests.len(), "Checking manifests");

    let mut check = VersionCheck::new(args.options()).with_reference_time(now);
    let summary = check.run_in(source, &base, &manifests).await?;

    if let Some(path) = &args.summary_json {
        write_summary_json(path, summary)?;
    }
    if let Some(path) = &args.summary_md {
        write_summary_md(path, &summary.rows)?;
    }

    print_check_summary(
        summary,
        json,
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    )
}

/// Print the check result. In JSON mode `out` carries nothing but the
/// summary document and the failure notice goes to `diag`.
fn print_check_summary(
    summary: &CheckSummary,
    json: bool,
    out: &mut dyn Write,
    diag: &mut dyn Write,
) -> Result<bool> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(summary)?)?;
    } else {
        write!(out, "{}", render_summary_md(&summary.rows))?;
        if !summary.updated_files.is_empty() {
            writeln!(out)?;
            writeln!(out, "Updated manifest files:")?;
            for file in &summary.updated_files {
                writeln!(out, "  {}", file)?;
            }
        }
    }

    if summary.has_errors() {
        let notice = "Invalid versions in manifest files detected!";
        if json {
            writeln!(diag, "{notice}")?;
        } else {
            writeln!(out, "{notice}")?;
        }
        return Ok(false);
    }
    Ok(true)
}

/// Validate bare version strings.
async fn cmd_validate(
    source: &dyn CatalogueSource,
    versions: &[String],
    options: ValidationOptions,
    json: bool,
    now: DateTime<Utc>,
) -> Result<bool> {
    let results = fetch_and_validate(source, versions, options, now).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            let icon = if result.valid { "✓" } else { "✗" };
            let details = result
                .messages
                .iter()
                .map(|m| m.text.as_str())
                .collect::<Vec<_>>()
                .join(MESSAGE_SEPARATOR);
            if details.is_empty() {
                println!("{} {}", icon, result.version);
            } else {
                println!("{} {}: {}", icon, result.version, details);
            }
        }
    }

    Ok(results.iter().all(|r| r.valid))
}

/// Print the replacement version.
async fn cmd_latest(
    source: &dyn CatalogueSource,
    lts: bool,
    json: bool,
    now: DateTime<Utc>,
) -> Result<bool> {
    let version = fetch_latest_version(source, lts, now).await?;
    if json {
        println!("{}", json!({ "version": version, "lts": lts }));
    } else {
        println!("{}", version);
    }
    Ok(true)
}
