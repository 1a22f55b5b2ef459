use std::path::PathBuf;

use clap::Parser;
use palmistry_common::clock::Clock;
use palmistry_config_file::PalmistryConfigToml;
use palmistry_server::api::{run_server, ServerConfig};

/// Temporary image store the analysis backend fetches uploads from
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to palmistry.toml
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let args = Args::parse();

    let config = PalmistryConfigToml::load(args.config.as_deref()).map_err(std::io::Error::other)?;
    let mut config = ServerConfig::from_config_toml(&config, Clock::new());
    if let Some(port) = args.port {
        config.port = port;
    }
    run_server(config).await
}
