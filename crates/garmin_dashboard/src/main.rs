use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use garmin_connect_client::config::Config;
use garmin_connect_client::http_client::ReqwestGarminClient;
use garmin_dashboard::{FetchOptions, SnapshotStore, pipeline, scheduler};

#[derive(Parser)]
#[command(
    name = "garmin-dashboard",
    version,
    about = "Fetch Garmin Connect activities, aggregate stats and publish a static dashboard"
)]
struct Cli {
    /// Directory for fetched activity snapshots.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// Output directory for the static site.
    #[arg(long, default_value = "docs")]
    site_dir: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch activities and persist the snapshot.
    Fetch(FetchArgs),
    /// Render the static site from the existing snapshot.
    Render,
    /// Fetch then render; the one-shot entry point for a scheduled job.
    Run(FetchArgs),
    /// Keep running, executing a full update on a cron schedule.
    Schedule(ScheduleArgs),
}

#[derive(Args, Clone)]
struct FetchArgs {
    /// Only keep activities started within this many days.
    #[arg(long, default_value_t = 365)]
    days_back: u32,
    /// Activities per list request.
    #[arg(long, default_value_t = 100)]
    page_size: u32,
    /// Stop fetching after this many activities.
    #[arg(long)]
    max_activities: Option<u32>,
    /// Enrich each activity with start coordinates from the detail endpoint.
    #[arg(long)]
    with_coordinates: bool,
}

#[derive(Args, Clone)]
struct ScheduleArgs {
    /// Cron expression, seconds first: "0 0 6 * * *" runs 06:00 daily (local time).
    #[arg(long)]
    cron: String,
    #[command(flatten)]
    fetch: FetchArgs,
}

impl From<&FetchArgs> for FetchOptions {
    fn from(args: &FetchArgs) -> Self {
        Self {
            days_back: args.days_back,
            page_size: args.page_size,
            max_activities: args.max_activities,
            with_coordinates: args.with_coordinates,
        }
    }
}

fn init_tracing() {
    // Log filter from `GARMIN_DASHBOARD_LOG` (or fallback to `RUST_LOG`, default `info`).
    let log_env = std::env::var("GARMIN_DASHBOARD_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(&log_env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
}

fn client_from_env() -> anyhow::Result<ReqwestGarminClient> {
    let cfg = Config::from_env()?;
    Ok(ReqwestGarminClient::new(
        &cfg.base_url,
        cfg.email.clone(),
        cfg.password,
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let store = SnapshotStore::new(&cli.data_dir);

    match &cli.command {
        Command::Fetch(args) => {
            let client = client_from_env()?;
            let kept = pipeline::fetch(&client, &store, &args.into()).await?;
            tracing::info!(activities = kept.len(), "fetch complete");
        }
        Command::Render => {
            let data = pipeline::render(&store, &cli.site_dir)?;
            tracing::info!(
                activities = data.summary.total_activities,
                site_dir = %cli.site_dir.display(),
                "site rendered"
            );
        }
        Command::Run(args) => {
            let client = client_from_env()?;
            pipeline::run(&client, &store, &cli.site_dir, &args.into()).await?;
        }
        Command::Schedule(args) => {
            let schedule = scheduler::parse_schedule(&args.cron)?;
            let client = client_from_env()?;
            let opts: FetchOptions = (&args.fetch).into();
            scheduler::run_on_schedule(&schedule, || {
                let client = client.clone();
                let store = store.clone();
                let site_dir = cli.site_dir.clone();
                let opts = opts.clone();
                async move {
                    pipeline::run(&client, &store, &site_dir, &opts)
                        .await
                        .map(|_| ())
                }
            })
            .await;
        }
    }

    Ok(())
}
