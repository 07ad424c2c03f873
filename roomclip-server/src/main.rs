use clap::Parser;
use roomclip_server::{AppState, serve};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "roomclip-server")]
struct ServerArgs {
    #[arg(long, default_value = "0.0.0.0:8001")]
    bind_address: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = ServerArgs::parse();
    let listener = match tokio::net::TcpListener::bind(&args.bind_address).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {}: {}", args.bind_address, err);
            std::process::exit(1);
        }
    };

    info!("room backend starting on {}", args.bind_address);
    if let Err(err) = serve(listener, AppState::new()).await {
        warn!("room backend exited: {}", err);
    }
}
