mod aggregate;
mod categories;
mod dedup;
mod feed;
mod fetch;
mod history;
mod lexicon;
mod merge;
mod models;
mod orchestrator;
mod relevance;
mod sentiment;
mod store;
mod text;
mod window;

use anyhow::{bail, Result};
use chrono::Utc;
use chrono_tz::America::New_York;
use clap::Parser;
use tracing::{debug, info};
use url::Url;

use fetch::FetchConfig;
use orchestrator::{run_backfill, run_pipeline, RunOptions};
use store::Store;

/// Youth Pulse - political engagement analytics for the 18-29 cohort
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Data directory for snapshot, history, feed, cache and status files
    #[arg(short, long, default_value = "data")]
    data_dir: String,

    /// Pulse events API endpoint
    #[arg(long, env = "PULSE_ENDPOINT")]
    endpoint: Option<Url>,

    /// Bearer token for the events API
    #[arg(long, env = "PULSE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Demographic cohort requested from the API
    #[arg(long, default_value = "18-29")]
    cohort: String,

    /// Run without the network, seeding events from the existing snapshot
    #[arg(long)]
    offline: bool,

    /// Ignore the incremental cursor and re-query the full 24h window
    #[arg(long)]
    force_full: bool,

    /// Rebuild missing history days from the sources cache, then exit
    #[arg(long)]
    backfill: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    info!("Starting youth_pulse");

    let args = Args::parse();
    let store = Store::new(&args.data_dir)?;

    // Dashboard days roll at Eastern midnight, so log the run's ET date.
    let eastern_now = Utc::now().with_timezone(&New_York);
    info!(
        "Run context - et_date={}, data_dir={}",
        eastern_now.format("%Y-%m-%d"),
        args.data_dir
    );
    debug!(
        "Using Eastern timezone - current_time={}",
        eastern_now.format("%Y-%m-%d %H:%M:%S %Z")
    );

    if args.backfill {
        return run_backfill(&store);
    }

    let fetch = if args.offline {
        None
    } else {
        match (args.endpoint, args.token) {
            (Some(endpoint), Some(token)) => Some(FetchConfig {
                endpoint,
                token,
                cohort: args.cohort,
            }),
            _ => bail!(
                "An API endpoint and token are required unless --offline is set.\n\
                 Pass --endpoint/--token or set PULSE_ENDPOINT and PULSE_TOKEN."
            ),
        }
    };

    run_pipeline(
        &store,
        &RunOptions {
            fetch,
            force_full: args.force_full,
        },
    )
    .await
}
