#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Siege Defence sessions headlessly.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use siege_defence_config::load_scenario;
use siege_defence_core::{Position, Scenario};
use siege_defence_headless::Session;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info";

/// Headless driver for the Siege Defence wave simulation.
#[derive(Debug, Parser)]
#[command(name = "siege-defence", version)]
struct Cli {
    /// Tracing filter directive; falls back to RUST_LOG, then `info`.
    #[arg(long, global = true)]
    log_filter: Option<String>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Plays a scenario until it is won, lost or the frame budget runs out.
    Run(RunArgs),
    /// Loads a scenario file and reports whether it is valid.
    Validate {
        /// Scenario file to check.
        path: PathBuf,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Scenario file; the stock level is used when omitted.
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Simulated milliseconds per frame.
    #[arg(long, default_value_t = 50)]
    dt_ms: u64,
    /// Frames to run before giving up on a verdict.
    #[arg(long, default_value_t = 20_000)]
    max_frames: u64,
    /// Tower to buy once the shop opens, written as NAME@X,Z.
    #[arg(long = "buy", value_name = "NAME@X,Z")]
    purchases: Vec<String>,
    /// Prints the final report as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_filter.as_deref());

    match cli.command {
        CliCommand::Run(args) => run(args),
        CliCommand::Validate { path } => validate(path),
    }
}

fn init_tracing(explicit: Option<&str>) {
    let filter = match explicit {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run(args: RunArgs) -> Result<()> {
    if args.dt_ms == 0 {
        bail!("--dt-ms must be greater than zero");
    }

    let scenario = match &args.scenario {
        Some(path) => load_scenario(path)
            .with_context(|| format!("failed to load scenario {}", path.display()))?,
        None => Scenario::default(),
    };
    info!(
        waves = scenario.wave_count(),
        towers = scenario.towers.len(),
        dt_ms = args.dt_ms,
        "starting headless session"
    );

    let mut session = Session::new(scenario);
    for purchase in &args.purchases {
        let (name, position) = parse_purchase(purchase)?;
        let Some(blueprint) = session.scenario().tower_by_name(name) else {
            bail!("scenario has no tower named `{name}`");
        };
        session.plan_purchase(blueprint, position);
    }

    let report = session.run_until_finished(Duration::from_millis(args.dt_ms), args.max_frames);
    if args.json {
        let json =
            serde_json::to_string_pretty(&report).context("failed to serialise session report")?;
        println!("{json}");
    } else {
        println!("{report}");
    }
    Ok(())
}

fn validate(path: PathBuf) -> Result<()> {
    println!("{}", describe(&path)?);
    Ok(())
}

fn describe(path: &Path) -> Result<String> {
    let scenario = load_scenario(path)
        .with_context(|| format!("scenario {} is invalid", path.display()))?;

    Ok(format!(
        "{}: {} enemies, {} towers, {} waves",
        path.display(),
        scenario.enemies.len(),
        scenario.towers.len(),
        scenario.wave_count()
    ))
}

fn parse_purchase(spec: &str) -> Result<(&str, Position)> {
    let Some((name, coordinates)) = spec.split_once('@') else {
        bail!("purchase `{spec}` must look like NAME@X,Z");
    };
    let Some((x, z)) = coordinates.split_once(',') else {
        bail!("purchase `{spec}` must give coordinates as X,Z");
    };

    let x: f32 = x
        .trim()
        .parse()
        .with_context(|| format!("invalid x coordinate in `{spec}`"))?;
    let z: f32 = z
        .trim()
        .parse()
        .with_context(|| format!("invalid z coordinate in `{spec}`"))?;
    if name.is_empty() {
        bail!("purchase `{spec}` names no tower");
    }

    Ok((name, Position::ground(x, z)))
}

#[cfg(test)]
mod tests {
    use super::{describe, parse_purchase, Cli};
    use clap::CommandFactory;
    use siege_defence_config::ConfigError;
    use siege_defence_core::Position;

    #[test]
    fn purchases_parse_name_and_ground_position() {
        let (name, position) = parse_purchase("frost@2.5,-4").expect("valid purchase");
        assert_eq!(name, "frost");
        assert_eq!(position, Position::ground(2.5, -4.0));
    }

    #[test]
    fn malformed_purchases_are_rejected() {
        for spec in ["frost", "frost@2.5", "@1,2", "frost@x,2"] {
            assert!(parse_purchase(spec).is_err(), "{spec} should be rejected");
        }
    }

    #[test]
    fn command_line_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn missing_scenario_reports_an_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("absent.toml");

        let error = describe(&path).expect_err("file does not exist");
        assert!(matches!(
            error.downcast_ref::<ConfigError>(),
            Some(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn stock_scenario_is_described() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../scenarios/stock.toml");
        let summary = describe(&path).expect("stock scenario is valid");
        assert!(summary.ends_with("2 enemies, 2 towers, 3 waves"));
    }
}
