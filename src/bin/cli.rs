//! CLI for task submission and cluster inspection

use clap::{Parser, Subcommand};
use taskherd::admin;
use taskherd::common::Config;
use taskherd::session;
use taskherd::Submitter;

#[derive(Parser)]
#[command(name = "taskherd")]
#[command(about = "taskherd cluster CLI")]
#[command(version)]
struct Cli {
    /// Coordination service endpoint (overrides config)
    #[arg(long)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Queue a task command, printing its assigned path
    Submit {
        /// Command to run
        command: String,
    },

    /// Show master, workers and pending tasks
    Status {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load();
    let endpoint = cli
        .endpoint
        .unwrap_or_else(|| config.endpoint.clone());
    let session = session::connect(&endpoint, config.session_timeout()).await?;

    match cli.command {
        Commands::Submit { command } => {
            let submitter = Submitter::new(session).with_retry_delay(config.retry_delay());
            let path = submitter.submit(&command).await?;
            println!("{}", path);
        }

        Commands::Status { json } => {
            let state = admin::cluster_state(session.as_ref()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                print!("{}", state);
            }
        }
    }

    Ok(())
}
