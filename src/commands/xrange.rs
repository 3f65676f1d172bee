use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{
        command_error::CommandError,
        stream_utils::{parse_range_end, parse_range_start, stream_entries_to_resp},
    },
    key_value_store::{DataType, KeyValueStore, StreamEntry, get_live_entry},
    resp::RespValue,
};

/// Handles the XRANGE command.
///
/// Returns the stream entries whose IDs fall inside the inclusive
/// `[start, end]` range. `-` and `+` select the smallest and largest
/// possible IDs; a bare `<ms>` bound covers that whole millisecond bucket.
/// A missing key yields an empty array.
pub async fn xrange(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<String, CommandError> {
    if arguments.len() != 3 {
        return Err(CommandError::WrongNumberOfArguments("xrange"));
    }

    let start = parse_range_start(&arguments[1])?;
    let end = parse_range_end(&arguments[2])?;

    let mut store_guard = store.lock().await;

    match get_live_entry(&mut store_guard, &arguments[0]) {
        Some(value) => {
            let DataType::Stream(ref stream) = value.data else {
                return Err(CommandError::WrongType);
            };

            let entries = stream
                .iter()
                .filter(|entry| start <= entry.id && entry.id <= end)
                .cloned()
                .collect::<Vec<StreamEntry>>();

            Ok(stream_entries_to_resp(&entries).encode())
        }
        None => Ok(RespValue::Array(Vec::new()).encode()),
    }
}
