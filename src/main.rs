use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use wakabeat::activity::{ActivityAggregator, EventKind};
use wakabeat::heartbeat::{HeartbeatService, HttpSink};
use wakabeat::Config;

#[derive(Parser)]
#[command(name = "wakabeat")]
#[command(about = "WakaTime-compatible editor activity heartbeat reporter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reporter: read events from stdin, flush periodically
    Run,
    /// Send one diagnostic heartbeat immediately and exit
    Send {
        /// Entity name to report as saved
        #[arg(short, long, default_value = "wakabeat-test")]
        entity: String,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) | None => {
            println!("wakabeat {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Run) => {
            let config = Config::load().with_context(|| "Failed to load configuration")?;
            let aggregator = Arc::new(ActivityAggregator::new());
            let sink = Arc::new(HttpSink::new().with_context(|| "Failed to build HTTP client")?);
            let service =
                HeartbeatService::new(Arc::clone(&aggregator), sink, config);

            service.start().await?;

            // The feed runs until stdin closes; stop the ticker afterwards.
            // In-flight sends are abandoned, heartbeats are best-effort.
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            wakabeat::feed::run(stdin, aggregator).await?;
            service.stop().await;
        }
        Some(Commands::Send { entity }) => {
            let config = Config::load().with_context(|| "Failed to load configuration")?;
            if config.trimmed_token().is_empty() {
                anyhow::bail!(
                    "No API token configured. Set WAKABEAT_API_TOKEN or edit {:?}",
                    Config::path()
                );
            }
            let aggregator = Arc::new(ActivityAggregator::new());
            aggregator.record(
                EventKind::Save,
                chrono::Utc::now().timestamp(),
                Some(&entity),
            );
            let sink = Arc::new(HttpSink::new().with_context(|| "Failed to build HTTP client")?);
            let service = HeartbeatService::new(aggregator, sink, config);
            if let Some(handle) = service.trigger_now() {
                handle.await.ok();
            }
        }
    }

    Ok(())
}
