#![cfg(not(tarpaulin_include))]

use solution_dashboard::app;
use solution_dashboard::config::ServerConfig;

/// Main entry point for the web gateway
///
/// Loads the configuration (`DASHBOARD_CONFIG` file, then `PORT`) and serves
/// until the process is stopped.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::load()?;
    app::run(config).await
}
