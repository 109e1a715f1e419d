#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Fyn housing dashboard server.
//!
//! ```text
//! fyn_housing_server [--config dashboard.toml] [--data-dir data] [--port 8080]
//! ```
//!
//! Loads the sales, zip-area and population files once at startup and
//! serves the dashboard API.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use fyn_housing_dashboard::{Dashboard, DashboardConfig};
use fyn_housing_server::{ServerOptions, run_server};

#[derive(Parser)]
#[command(
    name = "fyn_housing_server",
    about = "Serve the Fyn housing sales dashboard"
)]
struct Cli {
    /// TOML file overriding the built-in configuration
    #[arg(long, env = "FYN_HOUSING_CONFIG")]
    config: Option<PathBuf>,

    /// Directory containing the input data files
    #[arg(long, env = "FYN_HOUSING_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Address to bind to
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Directory of frontend files to serve at `/`
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            log::info!("Loading configuration from {}", path.display());
            DashboardConfig::load(path)?
        }
        None => DashboardConfig::builtin()?,
    };
    if let Some(dir) = cli.data_dir {
        config.data.dir = dir;
    }

    log::info!("Loading dataset from {}...", config.data.dir.display());
    let context = fyn_housing_dataset::load(&config.data.paths(), &config.data.options)?;
    let dashboard = Dashboard::new(Arc::new(context), config)?;

    run_server(
        Arc::new(dashboard),
        ServerOptions {
            bind_addr: cli.bind,
            port: cli.port,
            static_dir: cli.static_dir,
        },
    )
    .await?;

    Ok(())
}
