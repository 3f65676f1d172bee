use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::command_error::CommandError,
    key_value_store::{DataType, KeyValueStore, get_live_entry},
    resp::RespValue,
};

pub async fn type_command(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<String, CommandError> {
    if arguments.len() != 1 {
        return Err(CommandError::WrongNumberOfArguments("type"));
    }

    let mut store_guard = store.lock().await;

    let type_name = match get_live_entry(&mut store_guard, &arguments[0]) {
        Some(value) => match value.data {
            DataType::String(_) => "string",
            DataType::Array(_) => "list",
            DataType::Stream(_) => "stream",
        },
        None => "none",
    };

    Ok(RespValue::SimpleString(type_name.to_string()).encode())
}
