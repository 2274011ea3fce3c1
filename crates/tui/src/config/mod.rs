use std::time::Duration;

use chrono_tz::Tz;
use clap::Parser;
use engine::Money;
use serde::Deserialize;

use crate::error::{AppError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/caja_tui.toml";
const ENV_PREFIX: &str = "CAJA_TUI";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Endpoint receiving every `{fn, params}` call.
    pub base_url: String,
    /// Cashier name sent as `usuario`.
    pub usuario: String,
    /// Driver preselected in the reconciliation form.
    pub repartidor: String,
    pub timezone: String,
    pub poll_interval_secs: u64,
    pub timeout_secs: u64,
    /// Surpluses above this amount (pesos) ask for confirmation before submit.
    pub surplus_confirm_threshold: i64,
    pub log_file: String,
    pub state_path: String,
    pub proveedores: Vec<String>,
    pub vehiculos: Vec<String>,
    pub empleados: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            usuario: String::new(),
            repartidor: String::new(),
            timezone: "America/Argentina/Buenos_Aires".to_string(),
            poll_interval_secs: 30,
            timeout_secs: 15,
            surplus_confirm_threshold: 50_000,
            log_file: "caja_tui.log".to_string(),
            state_path: "config/caja_tui_state.json".to_string(),
            proveedores: Vec::new(),
            vehiculos: Vec::new(),
            empleados: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone.parse().map_err(|err| AppError::Setting {
            key: "timezone",
            reason: format!("{err}"),
        })
    }

    /// Never shorter than one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn surplus_limit(&self) -> Money {
        Money::from_pesos(self.surplus_confirm_threshold)
    }
}

#[derive(Debug, Parser)]
#[command(name = "caja_tui", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override service URL.
    #[arg(long)]
    base_url: Option<String>,
    /// Override cashier name.
    #[arg(long)]
    usuario: Option<String>,
    /// Override preselected driver.
    #[arg(long)]
    repartidor: Option<String>,
    /// Override timezone (IANA name).
    #[arg(long)]
    timezone: Option<String>,
    /// Override log file path.
    #[arg(long)]
    log_file: Option<String>,
}

pub fn load() -> Result<AppConfig> {
    settings(Args::parse())
}

fn settings(args: Args) -> Result<AppConfig> {
    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(usuario) = args.usuario {
        settings.usuario = usuario;
    }
    if let Some(repartidor) = args.repartidor {
        settings.repartidor = repartidor;
    }
    if let Some(timezone) = args.timezone {
        settings.timezone = timezone;
    }
    if let Some(log_file) = args.log_file {
        settings.log_file = log_file;
    }

    settings.tz()?;
    Ok(settings)
}
