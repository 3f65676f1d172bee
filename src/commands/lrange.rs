use std::{collections::VecDeque, sync::Arc};

use tokio::sync::Mutex;

use crate::{
    commands::command_error::CommandError,
    key_value_store::{DataType, KeyValueStore, get_live_entry},
    resp::RespValue,
};

pub async fn lrange(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<String, CommandError> {
    if arguments.len() != 3 {
        return Err(CommandError::WrongNumberOfArguments("lrange"));
    }

    let start_index = arguments[1]
        .parse::<i64>()
        .map_err(|_| CommandError::NotAnInteger)?;
    let end_index = arguments[2]
        .parse::<i64>()
        .map_err(|_| CommandError::NotAnInteger)?;

    let mut store_guard = store.lock().await;

    match get_live_entry(&mut store_guard, &arguments[0]) {
        Some(value) => {
            let DataType::Array(ref list) = value.data else {
                return Err(CommandError::WrongType);
            };

            let Ok((start, end)) = validate_range_indexes(list, start_index, end_index) else {
                return Ok(RespValue::Array(Vec::new()).encode());
            };

            let range = list
                .range(start..=end)
                .cloned()
                .collect::<Vec<String>>();

            Ok(RespValue::encode_array_from_strings(range))
        }
        None => Ok(RespValue::Array(Vec::new()).encode()),
    }
}

/// Normalizes LRANGE indexes against the list length.
///
/// Negative indexes count from the end (-1 is the last element). After
/// normalization the start is clamped to the front and the end to the back
/// of the list; an empty range is reported as an error string.
fn validate_range_indexes(
    list: &VecDeque<String>,
    start_index: i64,
    end_index: i64,
) -> Result<(usize, usize), &'static str> {
    let length = list.len() as i64;

    let mut start = if start_index < 0 {
        length + start_index
    } else {
        start_index
    };
    let mut end = if end_index < 0 {
        length + end_index
    } else {
        end_index
    };

    start = start.max(0);
    end = end.min(length - 1);

    if start >= length {
        return Err("Start index is out of bounds");
    }

    if start > end {
        return Err("Start index is bigger than end index after processing");
    }

    Ok((start as usize, end as usize))
}
