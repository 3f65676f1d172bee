use std::{collections::VecDeque, sync::Arc};

use tokio::sync::Mutex;

use crate::{
    commands::command_error::CommandError,
    key_value_store::{DataType, KeyValueStore, Value},
    resp::RespValue,
    state::State,
};

/// Handles the RPUSH command.
///
/// Appends one or more elements to the tail of a list, creating the list if
/// the key is absent. Fails with WRONGTYPE when the key holds a live value
/// of another kind.
pub async fn rpush(
    store: Arc<Mutex<KeyValueStore>>,
    state: Arc<Mutex<State>>,
    arguments: Vec<String>,
) -> Result<String, CommandError> {
    push_array_operations(store, state, arguments, false).await
}

/// Handles the LPUSH command.
///
/// Prepends elements one by one in argument order, so the final order of the
/// prepended block is the reverse of the arguments.
pub async fn lpush(
    store: Arc<Mutex<KeyValueStore>>,
    state: Arc<Mutex<State>>,
    arguments: Vec<String>,
) -> Result<String, CommandError> {
    push_array_operations(store, state, arguments, true).await
}

/// Shared implementation for RPUSH and LPUSH.
///
/// The push and the wake-up of blocked BLPOP clients happen under the same
/// critical section: the store lock is taken first, the state lock second,
/// and head elements are handed directly to waiters before either lock is
/// released. A reader can therefore never observe an element that has been
/// handed off, and a waiter registered before the push cannot miss it.
///
/// # Arguments
///
/// * `store` - The shared keyspace
/// * `state` - The shared waiter registry
/// * `arguments` - `[key, element1, element2, ...]`
/// * `should_prepend` - true for LPUSH, false for RPUSH
///
/// # Returns
///
/// * `Ok(String)` - A RESP integer holding the list length right after the
///   push (before any hand-off to waiters)
/// * `Err(CommandError::WrongNumberOfArguments)` - If fewer than 2 arguments
/// * `Err(CommandError::WrongType)` - If the key holds a non-list
async fn push_array_operations(
    store: Arc<Mutex<KeyValueStore>>,
    state: Arc<Mutex<State>>,
    arguments: Vec<String>,
    should_prepend: bool,
) -> Result<String, CommandError> {
    if arguments.len() < 2 {
        return Err(CommandError::WrongNumberOfArguments(if should_prepend {
            "lpush"
        } else {
            "rpush"
        }));
    }

    let key = &arguments[0];
    let mut store_guard = store.lock().await;

    // An expired string is semantically absent, so its key may be reused.
    if store_guard.get(key).is_some_and(Value::is_expired) {
        store_guard.remove(key);
    }

    let value = store_guard.entry(key.clone()).or_insert_with(|| Value {
        data: DataType::Array(VecDeque::new()),
        expiration: None,
    });

    let DataType::Array(ref mut list) = value.data else {
        return Err(CommandError::WrongType);
    };

    for element in arguments[1..].iter() {
        if should_prepend {
            list.push_front(element.clone());
        } else {
            list.push_back(element.clone());
        }
    }

    let array_length = list.len();

    let mut state_guard = state.lock().await;

    while state_guard.has_blpop_waiters(key) {
        let Some(element) = list.pop_front() else {
            break;
        };

        if let Err(element) = state_guard.deliver_to_blpop_waiter(key, element) {
            // Every remaining waiter was dead; keep the element.
            list.push_front(element);
            break;
        }
    }

    let is_now_empty = list.is_empty();

    if is_now_empty {
        store_guard.remove(key);
    }

    Ok(RespValue::Integer(array_length as i64).encode())
}
