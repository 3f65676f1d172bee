use std::{sync::Arc, time::Duration};

use tokio::sync::{Mutex, oneshot};

use crate::{
    commands::command_error::CommandError,
    key_value_store::{DataType, KeyValueStore, get_live_entry},
    resp::RespValue,
    state::{BlpopWaiter, State},
};

/// Represents the parsed arguments for the BLPOP command.
pub struct BlpopArguments {
    /// The list key to block and pop from.
    key: String,
    /// Blocking duration in seconds; 0.0 means block indefinitely.
    block_duration_secs: f64,
}

impl BlpopArguments {
    /// Parses command arguments into a `BlpopArguments` struct.
    ///
    /// # Arguments
    ///
    /// * `arguments` - `[key, timeout_seconds]`; the timeout may be
    ///   fractional and 0 means no deadline
    ///
    /// # Returns
    ///
    /// * `Ok(BlpopArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::WrongNumberOfArguments)` - If the argument count
    ///   is not exactly 2
    /// * `Err(CommandError::InvalidBlockTimeout)` - If the timeout is not a
    ///   representable decimal number
    /// * `Err(CommandError::NegativeBlockTimeout)` - If the timeout is below
    ///   zero
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 {
            return Err(CommandError::WrongNumberOfArguments("blpop"));
        }

        let block_duration_secs = arguments[1]
            .parse::<f64>()
            .map_err(|_| CommandError::InvalidBlockTimeout)?;

        if block_duration_secs < 0.0 {
            return Err(CommandError::NegativeBlockTimeout);
        }

        if block_duration_secs != 0.0 && Duration::try_from_secs_f64(block_duration_secs).is_err() {
            return Err(CommandError::InvalidBlockTimeout);
        }

        Ok(Self {
            key: arguments[0].clone(),
            block_duration_secs,
        })
    }
}

/// Handles the BLPOP command.
///
/// Pops the head of the list when one is available; otherwise parks the
/// session until a producer hands an element over, the deadline passes, or
/// the connection dies.
///
/// The emptiness check and the waiter registration happen under the store
/// lock (state lock nested inside), so a push committed concurrently either
/// lands before the check, in which case it is popped here, or after the
/// registration, in which case the producer delivers straight to this
/// waiter. There is no window in which an element can be missed.
///
/// # Arguments
///
/// * `client_address` - Identifies this session's registration so it can be
///   removed on timeout or disconnect
/// * `store` - The shared keyspace
/// * `state` - The shared waiter registry
/// * `arguments` - `[key, timeout_seconds]`
///
/// # Returns
///
/// * `Ok(String)` - A RESP array `[key, element]`, or a nil array when the
///   deadline passed without a delivery
/// * `Err(CommandError::WrongType)` - If the key holds a non-list
/// * `Err(CommandError)` - Argument parsing failures, see
///   [`BlpopArguments::parse`]
pub async fn blpop(
    client_address: &str,
    store: Arc<Mutex<KeyValueStore>>,
    state: Arc<Mutex<State>>,
    arguments: Vec<String>,
) -> Result<String, CommandError> {
    let blpop_arguments = BlpopArguments::parse(arguments)?;

    let mut receiver = {
        let mut store_guard = store.lock().await;

        match pop_first_element(&mut store_guard, &blpop_arguments.key)? {
            Some(element) => {
                return Ok(RespValue::encode_array_from_strings(vec![
                    blpop_arguments.key,
                    element,
                ]));
            }
            None => {
                let (sender, receiver) = oneshot::channel();
                let mut state_guard = state.lock().await;

                state_guard.add_blpop_waiter(
                    blpop_arguments.key.clone(),
                    BlpopWaiter {
                        client_address: client_address.to_string(),
                        sender,
                    },
                );

                receiver
            }
        }
    };

    match wait_for_element(&mut receiver, blpop_arguments.block_duration_secs).await {
        Some(element) => Ok(RespValue::encode_array_from_strings(vec![
            blpop_arguments.key,
            element,
        ])),
        None => {
            {
                let mut state_guard = state.lock().await;
                state_guard.remove_blpop_waiter(&blpop_arguments.key, client_address);
            }

            // A producer may have fulfilled the waiter between the deadline
            // firing and the registration being removed; that element must
            // not be dropped.
            match receiver.try_recv() {
                Ok(element) => Ok(RespValue::encode_array_from_strings(vec![
                    blpop_arguments.key,
                    element,
                ])),
                Err(_) => Ok(RespValue::NullArray.encode()),
            }
        }
    }
}

/// Removes and returns the head of the list stored at `key`, deleting the
/// key when the pop leaves the list empty.
fn pop_first_element(
    store: &mut KeyValueStore,
    key: &str,
) -> Result<Option<String>, CommandError> {
    let Some(value) = get_live_entry(store, key) else {
        return Ok(None);
    };

    let DataType::Array(ref mut list) = value.data else {
        return Err(CommandError::WrongType);
    };

    let popped = list.pop_front();

    if list.is_empty() {
        store.remove(key);
    }

    Ok(popped)
}

/// Waits for a producer to hand an element over, bounded by the blocking
/// duration. A duration of 0.0 waits indefinitely.
async fn wait_for_element(
    receiver: &mut oneshot::Receiver<String>,
    block_duration_secs: f64,
) -> Option<String> {
    if block_duration_secs == 0.0 {
        return receiver.await.ok();
    }

    match tokio::time::timeout(
        Duration::from_secs_f64(block_duration_secs),
        &mut *receiver,
    )
    .await
    {
        Ok(result) => result.ok(),
        Err(_) => None,
    }
}
