use std::collections::HashMap;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{error, info};

use miniredis::connection::handle_client_connection;
use miniredis::key_value_store::KeyValueStore;
use miniredis::state::State;

#[derive(Parser, Debug)]
struct Args {
    /// The port to listen on
    #[arg(short, long, default_value_t = 6379)]
    port: u16,
}

/// Binds the listener and serves clients until the process is stopped.
///
/// The key-value store and the waiter registry live for the whole process
/// and are shared by every connection task.
#[tokio::main]
async fn main() {
    let _ = tracing_subscriber::fmt().try_init();

    let args = Args::parse();

    let listener = match TcpListener::bind(format!("127.0.0.1:{}", args.port)).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("failed to bind TCP listener: {}", e);
            return;
        }
    };

    info!("listening on 127.0.0.1:{}", args.port);

    let store: Arc<Mutex<KeyValueStore>> = Arc::new(Mutex::new(HashMap::new()));
    let state: Arc<Mutex<State>> = Arc::new(Mutex::new(State::new()));

    loop {
        match listener.accept().await {
            Ok((stream, address)) => {
                let store = Arc::clone(&store);
                let state = Arc::clone(&state);

                tokio::spawn(async move {
                    handle_client_connection(stream, address.to_string(), store, state).await;
                });
            }
            Err(e) => {
                error!("failed to accept connection: {}", e);
            }
        }
    }
}
