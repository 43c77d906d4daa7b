// svctail - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Configuration loading and logging initialisation
// 3. Service catalog loading and name resolution
// 4. History replay followed by live follow on stdout

use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use svctail::app::present::Presenter;
use svctail::app::session::{self, AggregationSession};
use svctail::app::tail::HandoffMode;
use svctail::platform::catalog::ServiceCatalog;
use svctail::platform::config::{self, AppConfig, PlatformPaths};
use svctail::util::error::{Result, SvcTailError, UsageError};
use svctail::util::{constants, logging};

/// svctail - aggregated logs for locally managed services.
///
/// Replays the run logs of the selected services and groups in timestamp
/// order, then keeps following new output until interrupted.
#[derive(Parser, Debug)]
#[command(name = "svctail", version, about)]
struct Cli {
    /// Services or groups to show logs for.
    names: Vec<String>,

    /// Service catalog file (defaults to services.toml in the config directory).
    #[arg(short = 's', long = "services")]
    catalog: Option<PathBuf>,

    /// Configuration file (defaults to config.toml in the config directory).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// How live follow resumes after the history: "offset" or "line-count".
    #[arg(long = "handoff", value_parser = parse_handoff)]
    handoff: Option<HandoffMode>,

    /// Print the history and exit instead of following.
    #[arg(long = "no-follow")]
    no_follow: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn parse_handoff(value: &str) -> std::result::Result<HandoffMode, String> {
    HandoffMode::from_name(value)
        .ok_or_else(|| format!("'{value}' is not a handoff mode (expected offset or line-count)"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let paths = PlatformPaths::resolve();

    let (app_config, config_warnings) = match &cli.config {
        Some(path) => match config::load_config_explicit(path) {
            Ok(loaded) => loaded,
            Err(e) => return report(&SvcTailError::from(e)),
        },
        None => config::load_config(&paths.config_file),
    };

    logging::init(cli.debug, app_config.log_level.as_deref());

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        "svctail starting"
    );
    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Configuration warning");
    }

    match run(&cli, &app_config, &paths) {
        Ok(()) => ExitCode::SUCCESS,
        Err(SvcTailError::Io { source, .. }) if source.kind() == io::ErrorKind::BrokenPipe => {
            // Output closed (e.g. piped into `head`).
            ExitCode::SUCCESS
        }
        Err(e) => report(&e),
    }
}

fn run(cli: &Cli, app_config: &AppConfig, paths: &PlatformPaths) -> Result<()> {
    if cli.names.is_empty() {
        return Err(UsageError::NoSelection.into());
    }

    let catalog_path = cli
        .catalog
        .clone()
        .or_else(|| app_config.catalog_file.clone())
        .unwrap_or_else(|| paths.catalog_file.clone());
    let catalog = ServiceCatalog::load(&catalog_path)?;

    let mut follow = app_config.follow_config();
    if let Some(handoff) = cli.handoff {
        follow.handoff = handoff;
    }

    let session = AggregationSession::open(&cli.names, &catalog, follow)?;

    let stdout = io::stdout();
    let mut presenter = Presenter::new(stdout.lock(), session.label_sources());
    presenter.banner().map_err(session::output_error)?;

    session::watch(session, &mut presenter, !cli.no_follow)
}

/// Print an abort-level error with its cause chain and return failure.
fn report(err: &SvcTailError) -> ExitCode {
    tracing::error!(error = %err, "Aborting");

    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "Error: {err}");
    let mut cause = std::error::Error::source(err);
    while let Some(e) = cause {
        // Display of each layer already embeds its direct cause; only show
        // causes that add new text.
        let text = e.to_string();
        if !err.to_string().contains(&text) {
            let _ = writeln!(stderr, "  caused by: {text}");
        }
        cause = e.source();
    }
    ExitCode::FAILURE
}
