use anyhow::Result;
use clap::Parser;
use portpulse::application::system::Application;
use portpulse::config::Config;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Portfolio-impact intelligence engine.
#[derive(Parser, Debug)]
#[command(name = "portpulse", version)]
struct Cli {
    /// Seed companies, relationships, precedents, and a demo portfolio.
    #[arg(long)]
    seed: bool,

    /// Run a single workflow invocation and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let app = Arc::new(Application::build(config).await?);

    if cli.seed {
        app.seed().await?;
        info!("Seeding complete");
        if !cli.once {
            return Ok(());
        }
    }

    if cli.once {
        let state = app.run_once().await?;
        info!(
            "Workflow finished: loops={}, confidence={:.2}, alert={:?}",
            state.loop_count,
            state
                .validation
                .as_ref()
                .map(|v| v.confidence_score)
                .unwrap_or_default(),
            state.alert.as_ref().and_then(|a| a.alert_id.clone())
        );
        return Ok(());
    }

    app.start().await
}
