mod ai;
mod app;
mod config;
mod dashboard;
mod domain;
mod error;
mod infrastructure;
mod state;
mod tasks;
#[cfg(test)]
mod testing;
mod youtube;

use anyhow::Result;
use infrastructure::{directories, logging, shutdown};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config.directories)?;
    logging::init_tracing(&config, &paths)?;

    let (shutdown, _) = shutdown::Shutdown::new();
    shutdown::install_signal_handlers(shutdown.clone());

    let app = app::DashboardApp::initialize(config, shutdown)?;
    app.run().await
}
