// hbnb - Web Server
// REST API over the entity registry

use anyhow::Result;
use hbnb::api::{self, AppState};
use hbnb::{Config, ObjectRegistry};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = Config::load()?;

    // Restore-or-empty: a missing or corrupt store never stops startup
    let registry = ObjectRegistry::open_file(&config.file_path);
    tracing::info!(
        "Store {} opened with {} entities",
        config.file_path.display(),
        registry.count(None)
    );

    api::serve(&config.bind_addr(), AppState::new(registry)).await
}
