use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::debug;

use crate::commands::CommandHandler;
use crate::key_value_store::KeyValueStore;
use crate::resp::RespValue;
use crate::state::State;

/// Drives one client session: read, decode, execute, reply, repeat.
///
/// The session keeps a growable decode buffer so a command split across TCP
/// reads is reassembled, and every complete frame in a single read is
/// executed in order (pipelining). Commands run synchronously; BLPOP may
/// park the whole session until delivery or deadline, which also suspends
/// any pipelined commands behind it.
///
/// The session ends on client disconnect, I/O failure or protocol error; a
/// protocol error closes the connection without a reply. Teardown removes
/// any waiter registration the session left behind.
pub async fn handle_client_connection(
    stream: TcpStream,
    client_address: String,
    store: Arc<Mutex<KeyValueStore>>,
    state: Arc<Mutex<State>>,
) {
    let (mut reader, mut writer) = stream.into_split();
    let mut buffer = BytesMut::with_capacity(4096);

    'session: loop {
        match reader.read_buf(&mut buffer).await {
            Ok(0) => {
                debug!(client = %client_address, "client disconnected");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                debug!(client = %client_address, error = %e, "read failed");
                break;
            }
        }

        loop {
            let frame = match RespValue::decode(&mut buffer) {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    debug!(client = %client_address, error = %e, "protocol error");
                    break 'session;
                }
            };

            // Inbound frames are always arrays of bulk strings; anything
            // else at the top level is a protocol violation.
            if !matches!(frame, RespValue::Array(_)) {
                debug!(client = %client_address, "inbound frame is not a command array");
                break 'session;
            }

            let reply = match CommandHandler::new(&frame) {
                Ok(handler) => handler
                    .handle_command(&client_address, Arc::clone(&store), Arc::clone(&state))
                    .await
                    .unwrap_or_else(|e| e.as_string()),
                Err(e) => e.as_string(),
            };

            if let Err(e) = writer.write_all(reply.as_bytes()).await {
                debug!(client = %client_address, error = %e, "write failed");
                break 'session;
            }
        }
    }

    // A session that dies while parked in BLPOP must not leave its waiter
    // registration behind.
    state.lock().await.remove_client(&client_address);
}
