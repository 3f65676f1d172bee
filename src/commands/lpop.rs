use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::command_error::CommandError,
    key_value_store::{DataType, KeyValueStore, get_live_entry},
    resp::RespValue,
};

/// Represents the parsed arguments for the LPOP command.
pub struct LpopArguments {
    key: String,
    /// When present the reply is always an array, even for zero or one
    /// popped elements.
    count: Option<usize>,
}

impl LpopArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() || arguments.len() > 2 {
            return Err(CommandError::WrongNumberOfArguments("lpop"));
        }

        let count = match arguments.get(1) {
            Some(raw_count) => {
                let count = raw_count
                    .parse::<i64>()
                    .map_err(|_| CommandError::NotAnInteger)?;

                if count < 0 {
                    return Err(CommandError::NegativeCount);
                }

                Some(count as usize)
            }
            None => None,
        };

        Ok(Self {
            key: arguments[0].clone(),
            count,
        })
    }
}

pub async fn lpop(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<String, CommandError> {
    let lpop_arguments = LpopArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;

    let Some(value) = get_live_entry(&mut store_guard, &lpop_arguments.key) else {
        return Ok(match lpop_arguments.count {
            Some(_) => RespValue::NullArray.encode(),
            None => RespValue::NullBulkString.encode(),
        });
    };

    let DataType::Array(ref mut list) = value.data else {
        return Err(CommandError::WrongType);
    };

    let amount = lpop_arguments.count.unwrap_or(1).min(list.len());
    let popped = list.drain(..amount).collect::<Vec<String>>();
    let is_now_empty = list.is_empty();

    // Empty lists must not linger as keys.
    if is_now_empty {
        store_guard.remove(&lpop_arguments.key);
    }

    Ok(match lpop_arguments.count {
        Some(_) => RespValue::encode_array_from_strings(popped),
        None => match popped.into_iter().next() {
            Some(element) => RespValue::BulkString(element).encode(),
            None => RespValue::NullBulkString.encode(),
        },
    })
}
