use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trace_cli::{config::Config, repl};
use trace_core::AppBuilder;
use trace_persist::FileStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load configuration")?;

    init_logging(&config);

    tracing::info!("Starting Trace");
    tracing::info!("Backend: {}", config.backend.base_url);
    tracing::debug!("Session storage: {}", config.storage.dir.display());

    let mut app = AppBuilder::new()
        .backend_config(config.backend_config())
        .store(FileStore::new(&config.storage.dir))
        .settings(config.app_settings())
        .build()
        .context("Failed to build application")?;

    let screen = app.start().context("Failed to restore stored session")?;
    tracing::info!("Starting on {:?}", screen);

    let result = repl::run(&mut app).await;

    app.shutdown();
    tracing::info!("Bye");
    result
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Logs go to stderr so they never interleave with the conversation
    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }
}
