//! Worker binary

use clap::Parser;
use taskherd::common::{new_server_id, Config};
use taskherd::session::{self, SessionEvent};
use taskherd::Registrar;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "taskherd-worker")]
#[command(about = "taskherd worker")]
#[command(version)]
struct Cli {
    /// Coordination service endpoint (overrides config)
    #[arg(long)]
    endpoint: Option<String>,

    /// Server identity (random hex if omitted)
    #[arg(long)]
    id: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::load();
    let endpoint = cli.endpoint.unwrap_or_else(|| config.endpoint.clone());
    let server_id = cli.id.unwrap_or_else(new_server_id);

    let session = session::connect(&endpoint, config.session_timeout()).await?;
    let registrar =
        Registrar::new(session.clone(), server_id.clone()).with_retry_delay(config.retry_delay());
    info!(%endpoint, %server_id, "worker starting");

    registrar.register().await?;
    info!(path = registrar.status_path(), "presence registered, idling");

    let mut events = session.events();
    loop {
        tokio::select! {
            event = events.recv() => {
                if matches!(event, Ok(SessionEvent::Expired)) {
                    anyhow::bail!("session expired, presence record lost");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                return Ok(());
            }
        }
    }
}
