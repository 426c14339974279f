use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use online_redshift::config::Setup;
use online_redshift::constants::REDSHIFT_COLUMN;
use online_redshift::domain::{SkyPosition, Target};
use online_redshift::infra::{JsonTableStore, NedClient, ReqwestHttp, SkyMatcher, VizierClient};
use online_redshift::pipeline::{resolve_file, RedshiftPipeline, RunOutcome};
use online_redshift::{logging, metrics};

#[derive(Parser)]
#[command(name = "online_redshift")]
#[command(about = "Collect spectroscopic redshifts around a target from VizieR and NED")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query every source for one target and write the deduplicated redshift table
    Run {
        /// Output root; tables go under <path>/<name>/
        #[arg(long)]
        path: PathBuf,
        /// TOML run configuration
        #[arg(long)]
        config: PathBuf,
        /// Target name, resolved remotely unless RA/DEC are given
        #[arg(long)]
        name: String,
        /// Right ascension (degrees or hh:mm:ss)
        #[arg(long, requires = "dec", allow_hyphen_values = true)]
        ra: Option<String>,
        /// Declination (degrees or ±dd:mm:ss)
        #[arg(long, requires = "ra", allow_hyphen_values = true)]
        dec: Option<String>,
    },
    /// Keep one row per group of an already cross-matched table
    Resolve {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Column holding the redshift
        #[arg(long, default_value = REDSHIFT_COLUMN)]
        column: String,
    },
}

fn target_for(name: &str, ra: Option<&str>, dec: Option<&str>) -> Result<Target> {
    match (ra, dec) {
        (Some(ra), Some(dec)) => Ok(Target::Position(
            SkyPosition::parse(ra, dec).context("invalid target coordinates")?,
        )),
        (None, None) => Ok(Target::Name(name.to_string())),
        _ => bail!("--ra and --dec must be given together"),
    }
}

async fn run(
    path: PathBuf,
    config: PathBuf,
    name: String,
    ra: Option<String>,
    dec: Option<String>,
) -> Result<()> {
    let setup = Setup::load(&config)
        .with_context(|| format!("failed to load configuration {}", config.display()))?;
    let policy = setup.load_policy().context("failed to load policy table")?;
    let target = target_for(&name, ra.as_deref(), dec.as_deref())?;

    let http = Arc::new(
        ReqwestHttp::new(Duration::from_secs(setup.timeout_secs))
            .context("failed to build HTTP client")?,
    );
    let pipeline = RedshiftPipeline::new(
        Arc::new(VizierClient::new(http.clone(), setup.services.vizier_url.clone())),
        Arc::new(NedClient::new(http, setup.services.ned_url.clone())),
        Arc::new(SkyMatcher::default()),
        Arc::new(JsonTableStore),
        setup,
        policy,
    );

    match pipeline.run_target(&path, &name, &target).await? {
        RunOutcome::Completed {
            grand_rows,
            unique_rows,
            unique_path,
        } => {
            println!(
                "{}: {} redshifts, {} unique -> {}",
                name,
                grand_rows,
                unique_rows,
                unique_path.display()
            );
        }
        RunOutcome::NoRedshifts => {
            println!("No redshifts found for {}", name);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();
    metrics::init_metrics();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            path,
            config,
            name,
            ra,
            dec,
        } => run(path, config, name, ra, dec).await,
        Commands::Resolve {
            input,
            output,
            column,
        } => resolve_file(&JsonTableStore, &input, &output, &column).map(|rows| {
            info!("{} rows written to {}", rows, output.display());
        }),
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}
