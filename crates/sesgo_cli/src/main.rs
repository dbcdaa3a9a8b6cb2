use clap::Parser;
use sesgo_core::LabConfig;
use sesgo_gateway::GatewayServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the lab configuration file
    #[arg(short, long, default_value = "sesgo.toml")]
    config: String,

    /// Override the gateway bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the gateway bind port
    #[arg(long)]
    port: Option<u16>,

    /// Enable the debug fast-forward capability (never in production)
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    info!("Loading lab configuration from {}...", args.config);
    let mut config = LabConfig::load_or_default(&args.config);
    if let Some(host) = args.host {
        config.gateway.host = host;
    }
    if let Some(port) = args.port {
        config.gateway.port = port;
    }
    if args.debug {
        config.debug = true;
    }
    if config.debug {
        info!("Debug mode is ON: the cheat fast-forward path is reachable");
    }

    let server = GatewayServer::new(config);
    let handle = server.start();

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    handle.abort();
    Ok(())
}
