use std::sync::Arc;

use clap::Parser;
use roomclip_client::{
    api::HttpRoomApi,
    config::ClientConfig,
    console::{self, Input},
    controller::Command,
    host_clipboard::SystemClipboard,
    logging::init_logging,
    router::ViewRouter,
    runtime::ClientRuntime,
    session::SessionError,
};
use roomclip_core::DEFAULT_BACKEND_URL;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "roomclip", about = "Shared clipboard rooms from the terminal")]
struct ClientArgs {
    /// Base URL of the clipboard backend.
    #[arg(long, env = "ROOMCLIP_BACKEND_URL", default_value = DEFAULT_BACKEND_URL)]
    backend_url: String,
    /// Location to open first, e.g. /join or /clipboard/<room id>.
    #[arg(long, default_value = "/")]
    path: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_logging();
    let args = ClientArgs::parse();

    let config = match ClientConfig::from_backend_url(&args.backend_url) {
        Ok(config) => config,
        Err(err) => {
            error!("invalid configuration: {err}");
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    let api = match HttpRoomApi::new(&config) {
        Ok(api) => api,
        Err(err) => {
            error!("failed to set up backend client: {err}");
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    info!(backend_url = %api.base_url(), path = %args.path, "client starting");

    let (mut runtime, mut snapshots) =
        ClientRuntime::new(Arc::new(api), Box::new(SystemClipboard));
    let mut router = ViewRouter::new();

    if let Err(err) = runtime.dispatch(Command::Open(args.path)) {
        warn!("initial location rejected: {err}");
    }
    snapshots.mark_changed();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if snapshots.has_changed().unwrap_or(false) {
            let session = snapshots.borrow_and_update().clone();
            router.sync(&session);
            println!("\n{}", console::render(&session, router.active()));
        }

        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(err) => {
                        error!("stdin read failed: {err}");
                        break;
                    }
                };
                match console::parse_line(&line, runtime.session()) {
                    Ok(Input::Command(command)) => {
                        match runtime.dispatch(command) {
                            Ok(()) => {}
                            // Shown through the session message instead.
                            Err(SessionError::Validation(_)) => {}
                            Err(err) => {
                                info!("command rejected: {err}");
                                println!("! {err}");
                            }
                        }
                    }
                    Ok(Input::Help) => println!("{}", console::help_text(runtime.session().view())),
                    Ok(Input::Quit) => break,
                    Ok(Input::Empty) => {}
                    Err(err) => println!("! {err}"),
                }
            }
            Some(event) = runtime.next_event() => runtime.handle_event(event),
        }
    }

    info!("client exiting");
}
