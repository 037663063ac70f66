use anyhow::Context;
use housing_harvest::cli::Command;
use housing_harvest::{serve, AppState, Args, Config};
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse().unwrap_or_else(|e| e.exit());
    let config = Config::new(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;

    // Initialize logging; RUST_LOG takes precedence over the config file
    let level: Level = config.log.level.into();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase())),
        )
        .init();

    info!("🏠 Housing Harvest");

    let state = AppState::from_config(&config)?;

    match args.command {
        Some(Command::Export { output }) => {
            let path = output.unwrap_or_else(|| config.export.path.clone());
            let state = AppState {
                export_path: path.clone(),
                ..state
            };
            let bytes = state.export().await?;
            info!("💾 Saved {} bytes to {}", bytes.len(), path.display());
        }
        Some(Command::Serve) | None => {
            let listener = TcpListener::bind((config.server.host.as_str(), config.server.port))
                .await
                .with_context(|| {
                    format!("Failed to listen on {}:{}", config.server.host, config.server.port)
                })?;
            info!("Listening on {}:{}", config.server.host, config.server.port);
            serve(listener, state).await.context("Webserver failed")?;
        }
    }

    Ok(())
}
