use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, stream_utils::split_stream_id},
    key_value_store::{DataType, KeyValueStore, StreamEntry, StreamId, Value, get_live_entry},
    resp::RespValue,
};

const ID_NOT_GREATER_THAN_ZERO: &str = "The ID specified in XADD must be greater than 0-0";
const ID_NOT_GREATER_THAN_TOP: &str =
    "The ID specified in XADD is equal or smaller than the target stream top item";

/// The three shapes an XADD entry ID can take on the wire.
#[derive(Debug, PartialEq)]
pub enum EntryIdSpec {
    /// `*`: both parts generated from the wall clock.
    Auto,
    /// `<ms>-*`: explicit milliseconds, generated sequence number.
    MsAuto(u64),
    /// `<ms>-<seq>`: fully explicit.
    Explicit(StreamId),
}

impl EntryIdSpec {
    pub fn parse(raw: &str) -> Result<Self, CommandError> {
        if raw == "*" {
            return Ok(Self::Auto);
        }

        if let Some(raw_ms) = raw.strip_suffix("-*") {
            let ms = raw_ms.parse::<u64>().map_err(|_| {
                CommandError::InvalidStreamId(
                    "Invalid stream ID specified as stream command argument".to_string(),
                )
            })?;

            return Ok(Self::MsAuto(ms));
        }

        let (ms, seq) = split_stream_id(raw)?;

        let Some(seq) = seq else {
            return Err(CommandError::InvalidStreamId(
                "Invalid stream ID specified as stream command argument".to_string(),
            ));
        };

        Ok(Self::Explicit(StreamId { ms, seq }))
    }
}

/// Represents the parsed arguments for the XADD command.
pub struct XaddArguments {
    key: String,
    id_spec: EntryIdSpec,
    /// Field-value pairs in argument order.
    fields: Vec<(String, String)>,
}

impl XaddArguments {
    /// Parses command arguments into an `XaddArguments` struct.
    ///
    /// # Arguments
    ///
    /// * `arguments` - `[key, id_spec, field1, value1, field2, value2, ...]`
    ///
    /// # Returns
    ///
    /// * `Ok(XaddArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::WrongNumberOfArguments)` - If no field-value pair
    ///   is present or a field is missing its value
    /// * `Err(CommandError::InvalidStreamId)` - If the ID spec matches none
    ///   of the accepted shapes
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 4 || arguments[2..].len() % 2 != 0 {
            return Err(CommandError::WrongNumberOfArguments("xadd"));
        }

        Ok(Self {
            key: arguments[0].clone(),
            id_spec: EntryIdSpec::parse(&arguments[1])?,
            fields: arguments[2..]
                .chunks(2)
                .map(|chunk| (chunk[0].clone(), chunk[1].clone()))
                .collect(),
        })
    }
}

/// Handles the XADD command.
///
/// Resolves the entry ID against the current stream top, appends the entry
/// and replies with the concrete `<ms>-<seq>` as a bulk string. The append
/// happens only after the ID is fully validated, so a rejected XADD leaves
/// the store untouched (including the case where the key did not exist yet).
pub async fn xadd(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<String, CommandError> {
    let xadd_arguments = XaddArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;

    let last_id = match get_live_entry(&mut store_guard, &xadd_arguments.key) {
        Some(value) => {
            let DataType::Stream(ref stream) = value.data else {
                return Err(CommandError::WrongType);
            };

            stream.last().map(|entry| entry.id)
        }
        None => None,
    };

    let id = resolve_entry_id(&xadd_arguments.id_spec, last_id)?;

    let entry = StreamEntry {
        id,
        fields: xadd_arguments.fields,
    };

    match store_guard.get_mut(&xadd_arguments.key) {
        Some(value) => {
            if let DataType::Stream(ref mut stream) = value.data {
                stream.push(entry);
            }
        }
        None => {
            store_guard.insert(
                xadd_arguments.key,
                Value {
                    data: DataType::Stream(vec![entry]),
                    expiration: None,
                },
            );
        }
    }

    Ok(RespValue::BulkString(id.to_string()).encode())
}

/// Resolves an ID spec into a concrete entry ID, enforcing the ordering
/// rules against the stream's current top entry.
fn resolve_entry_id(
    id_spec: &EntryIdSpec,
    last_id: Option<StreamId>,
) -> Result<StreamId, CommandError> {
    match id_spec {
        EntryIdSpec::Auto => next_id_in_bucket(unix_time_ms()?, last_id),
        EntryIdSpec::MsAuto(ms) => next_id_in_bucket(*ms, last_id),
        EntryIdSpec::Explicit(id) => {
            if id.ms == 0 && id.seq == 0 {
                return Err(CommandError::InvalidStreamId(
                    ID_NOT_GREATER_THAN_ZERO.to_string(),
                ));
            }

            match last_id {
                Some(last) if *id <= last => Err(CommandError::InvalidStreamId(
                    ID_NOT_GREATER_THAN_TOP.to_string(),
                )),
                _ => Ok(*id),
            }
        }
    }
}

/// Picks the next sequence number inside the `ms` bucket.
///
/// An empty stream starts its bucket at 0, except in the 0 bucket where the
/// first usable sequence is 1 (0-0 is reserved). A bucket older than the
/// stream top is rejected to keep IDs strictly increasing.
fn next_id_in_bucket(ms: u64, last_id: Option<StreamId>) -> Result<StreamId, CommandError> {
    match last_id {
        None => Ok(StreamId {
            ms,
            seq: if ms == 0 { 1 } else { 0 },
        }),
        Some(last) if last.ms == ms => Ok(StreamId {
            ms,
            seq: last.seq + 1,
        }),
        Some(last) if last.ms < ms => Ok(StreamId { ms, seq: 0 }),
        Some(_) => Err(CommandError::InvalidStreamId(
            ID_NOT_GREATER_THAN_TOP.to_string(),
        )),
    }
}

fn unix_time_ms() -> Result<u64, CommandError> {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| {
            CommandError::InvalidStreamId("System clock is before the Unix epoch".to_string())
        })?;

    Ok(since_epoch.as_millis() as u64)
}
