use clap::Parser;
use log::info;
use server::config::ServerConfig;
use server::network::{BoxError, Server};
use shared::{DEFAULT_HOST, DEFAULT_PORT};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Largest accepted row or column count
    #[arg(long, default_value = "256")]
    max_dimension: usize,

    /// Seconds a session may sit idle before it is dropped
    #[arg(long, default_value = "1800", value_parser = clap::value_parser!(u64).range(1..))]
    session_ttl: u64,

    /// Seconds between idle-session sweeps
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u64).range(1..))]
    reap_interval: u64,

    /// Fixed seed for board generation
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = ServerConfig {
        max_dimension: args.max_dimension,
        session_ttl: Duration::from_secs(args.session_ttl),
        reap_interval: Duration::from_secs(args.reap_interval),
        seed: args.seed,
    };

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::new(&address, config).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
