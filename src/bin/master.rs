//! Master candidate binary

use clap::Parser;
use taskherd::common::{new_server_id, Config};
use taskherd::session;
use taskherd::{Elector, MasterState};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "taskherd-master")]
#[command(about = "taskherd master candidate")]
#[command(version)]
struct Cli {
    /// Coordination service endpoint (overrides config)
    #[arg(long)]
    endpoint: Option<String>,

    /// Server identity (random hex if omitted)
    #[arg(long)]
    id: Option<String>,
}

/// Contest the seat, hold position, re-contest whenever the master
/// record disappears. Runs until the session dies.
async fn campaign(elector: Elector) -> anyhow::Result<()> {
    loop {
        let verdict = elector.run_for_leader().await?;
        match verdict {
            MasterState::Leader => info!("elected master, structure bootstrapped"),
            _ => info!("following the current master"),
        }
        elector.await_vacancy().await?;
        info!("master record gone, re-contesting");
    }
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
    let elector = Elector::new(session, server_id.clone()).with_retry_delay(config.retry_delay());
    info!(%endpoint, %server_id, "master candidate starting");

    tokio::select! {
        result = campaign(elector) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            Ok(())
        }
    }
}
