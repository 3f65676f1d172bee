use crate::{
    commands::command_error::CommandError,
    key_value_store::{StreamEntry, StreamId},
    resp::RespValue,
};

const INVALID_STREAM_ID: &str = "Invalid stream ID specified as stream command argument";

/// Splits `<ms>` or `<ms>-<seq>` into its numeric parts.
pub fn split_stream_id(raw: &str) -> Result<(u64, Option<u64>), CommandError> {
    let parts = raw.split('-').collect::<Vec<&str>>();

    if parts.len() > 2 || parts[0].is_empty() {
        return Err(CommandError::InvalidStreamId(INVALID_STREAM_ID.to_string()));
    }

    let ms = parts[0]
        .parse::<u64>()
        .map_err(|_| CommandError::InvalidStreamId(INVALID_STREAM_ID.to_string()))?;

    match parts.get(1) {
        Some(raw_seq) => {
            let seq = raw_seq
                .parse::<u64>()
                .map_err(|_| CommandError::InvalidStreamId(INVALID_STREAM_ID.to_string()))?;

            Ok((ms, Some(seq)))
        }
        None => Ok((ms, None)),
    }
}

/// Parses an XRANGE start bound. `-` is the smallest possible ID and a bare
/// `<ms>` covers its bucket from the first sequence number.
pub fn parse_range_start(raw: &str) -> Result<StreamId, CommandError> {
    if raw == "-" {
        return Ok(StreamId { ms: 0, seq: 0 });
    }

    let (ms, seq) = split_stream_id(raw)?;

    Ok(StreamId {
        ms,
        seq: seq.unwrap_or(0),
    })
}

/// Parses an XRANGE end bound. `+` is the largest possible ID and a bare
/// `<ms>` covers its bucket through the last sequence number.
pub fn parse_range_end(raw: &str) -> Result<StreamId, CommandError> {
    if raw == "+" {
        return Ok(StreamId {
            ms: u64::MAX,
            seq: u64::MAX,
        });
    }

    let (ms, seq) = split_stream_id(raw)?;

    Ok(StreamId {
        ms,
        seq: seq.unwrap_or(u64::MAX),
    })
}

/// Parses an XREAD position. Only entries strictly greater than the returned
/// ID match, so a bare `<ms>` maps to the end of its bucket and only later
/// millisecond buckets qualify.
pub fn parse_after_id(raw: &str) -> Result<StreamId, CommandError> {
    let (ms, seq) = split_stream_id(raw)?;

    Ok(StreamId {
        ms,
        seq: seq.unwrap_or(u64::MAX),
    })
}

/// Converts stream entries into the nested reply shape
/// `[[id, [field1, value1, ...]], ...]`.
pub fn stream_entries_to_resp(entries: &[StreamEntry]) -> RespValue {
    RespValue::Array(
        entries
            .iter()
            .map(|entry| {
                let mut fields = Vec::with_capacity(entry.fields.len() * 2);

                for (name, value) in &entry.fields {
                    fields.push(RespValue::BulkString(name.clone()));
                    fields.push(RespValue::BulkString(value.clone()));
                }

                RespValue::Array(vec![
                    RespValue::BulkString(entry.id.to_string()),
                    RespValue::Array(fields),
                ])
            })
            .collect(),
    )
}
