use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{
        command_error::CommandError,
        stream_utils::{parse_after_id, stream_entries_to_resp},
    },
    key_value_store::{DataType, KeyValueStore, StreamEntry, StreamId, get_live_entry},
    resp::RespValue,
};

/// Represents the parsed arguments for the XREAD command.
pub struct XreadArguments {
    /// Requested streams in request order, each with its exclusive
    /// lower-bound ID.
    streams: Vec<(String, StreamId)>,
}

impl XreadArguments {
    /// Parses command arguments into an `XreadArguments` struct.
    ///
    /// The accepted shape is `STREAMS key1 .. keyN id1 .. idN`: the keyword
    /// is case-insensitive and the keys and IDs must balance.
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 3 {
            return Err(CommandError::WrongNumberOfArguments("xread"));
        }

        if !arguments[0].eq_ignore_ascii_case("streams") {
            return Err(CommandError::SyntaxError);
        }

        let pairs = &arguments[1..];

        if pairs.len() % 2 != 0 {
            return Err(CommandError::UnbalancedXread);
        }

        let split_index = pairs.len() / 2;
        let mut streams = Vec::with_capacity(split_index);

        for i in 0..split_index {
            let after_id = parse_after_id(&pairs[split_index + i])?;
            streams.push((pairs[i].clone(), after_id));
        }

        Ok(Self { streams })
    }
}

/// Handles the XREAD command.
///
/// For each requested stream, returns the entries strictly greater than the
/// given ID. Streams without matches (or absent keys) are omitted from the
/// reply; when no stream matches at all the reply is a nil array.
pub async fn xread(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<String, CommandError> {
    let xread_arguments = XreadArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;
    let mut results: Vec<RespValue> = Vec::new();

    for (key, after_id) in &xread_arguments.streams {
        let Some(value) = get_live_entry(&mut store_guard, key) else {
            continue;
        };

        let DataType::Stream(ref stream) = value.data else {
            return Err(CommandError::WrongType);
        };

        let entries = stream
            .iter()
            .filter(|entry| entry.id > *after_id)
            .cloned()
            .collect::<Vec<StreamEntry>>();

        if !entries.is_empty() {
            results.push(RespValue::Array(vec![
                RespValue::BulkString(key.clone()),
                stream_entries_to_resp(&entries),
            ]));
        }
    }

    if results.is_empty() {
        return Ok(RespValue::NullArray.encode());
    }

    Ok(RespValue::Array(results).encode())
}
