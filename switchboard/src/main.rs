use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use switchboard_config::Config;
use switchboard_server::Server;

/// Switchboard LLM gateway
#[derive(Debug, Parser)]
#[command(name = "switchboard", about = "Request-routing gateway for LLM backends")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "switchboard.toml", env = "SWITCHBOARD_CONFIG")]
    config: PathBuf,

    /// Override the configured listen address
    #[arg(long, env = "SWITCHBOARD_LISTEN")]
    listen: Option<SocketAddr>,

    /// Default log filter; `RUST_LOG` still takes precedence
    #[arg(long, default_value = "info")]
    log_filter: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    if let Some(listen) = args.listen {
        config.server.listen_address = Some(listen);
    }

    switchboard_telemetry::init(&args.log_filter);

    tracing::info!(
        config_path = %args.config.display(),
        providers = config.providers.len(),
        "starting switchboard"
    );

    Server::new(&config)?.serve_until_signalled().await?;

    tracing::info!("switchboard stopped");
    Ok(())
}
