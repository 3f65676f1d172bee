use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::command_error::CommandError,
    key_value_store::{DataType, KeyValueStore, get_live_entry},
    resp::RespValue,
};

pub async fn get(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<String, CommandError> {
    if arguments.len() != 1 {
        return Err(CommandError::WrongNumberOfArguments("get"));
    }

    let mut store_guard = store.lock().await;

    match get_live_entry(&mut store_guard, &arguments[0]) {
        Some(value) => match value.data {
            DataType::String(ref content) => Ok(RespValue::BulkString(content.clone()).encode()),
            _ => Err(CommandError::WrongType),
        },
        None => Ok(RespValue::NullBulkString.encode()),
    }
}
