mod app;
mod client;
mod config;
mod error;
mod local_state;
mod ui;

use std::{fs::OpenOptions, sync::Mutex};

use tracing_subscriber::EnvFilter;

use crate::error::Result;

const DEFAULT_FILTER: &str = "caja_tui=info,engine=info";

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()?;
    init_logging(&config.log_file)?;

    let mut app = app::App::new(config)?;
    if let Err(err) = app.run().await {
        tracing::error!("terminal client failed: {err}");
        return Err(err);
    }
    Ok(())
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_logging(path: &str) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}
