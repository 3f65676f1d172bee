use std::io::Cursor;

use bytes::{Buf, BytesMut};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum RespError {
    #[error("incomplete frame")]
    Incomplete,
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
    #[error("unknown RESP type")]
    UnknownRespType,
    #[error("failed to parse integer")]
    FailedToParseInteger,
    #[error("invalid bulk string")]
    InvalidBulkString,
    #[error("invalid array")]
    InvalidArray,
}

/// The RESP value alphabet: five encodable types plus the nil forms of
/// bulk strings and arrays.
#[derive(Debug, PartialEq, Clone)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(String),
    NullBulkString,
    Array(Vec<RespValue>),
    NullArray,
}

impl RespValue {
    /// Decodes the next complete value from the front of `buffer`.
    ///
    /// The decoder is streaming: when the buffer holds only a prefix of a
    /// value, `Ok(None)` is returned and the buffer is left untouched so the
    /// caller can retry after the next read. When a full value is available
    /// its bytes are consumed from the buffer.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(RespValue))` - A complete value was decoded and consumed
    /// * `Ok(None)` - More bytes are needed
    /// * `Err(RespError)` - The buffer contents are not valid RESP; the
    ///   connection should be closed
    pub fn decode(buffer: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        if buffer.is_empty() {
            return Ok(None);
        }

        let mut cursor = Cursor::new(&buffer[..]);

        match Self::parse(&mut cursor) {
            Ok(value) => {
                let consumed = cursor.position() as usize;
                buffer.advance(consumed);
                Ok(Some(value))
            }
            Err(RespError::Incomplete) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn parse(cursor: &mut Cursor<&[u8]>) -> Result<RespValue, RespError> {
        let line = read_line(cursor)?;

        let Some((&type_byte, rest)) = line.split_first() else {
            return Err(RespError::UnknownRespType);
        };

        let rest = std::str::from_utf8(rest).map_err(|_| RespError::InvalidUtf8)?;

        match type_byte {
            b'+' => Ok(RespValue::SimpleString(rest.to_string())),
            b'-' => Ok(RespValue::Error(rest.to_string())),
            b':' => rest
                .parse::<i64>()
                .map(RespValue::Integer)
                .map_err(|_| RespError::FailedToParseInteger),
            b'$' => {
                if rest == "-1" {
                    return Ok(RespValue::NullBulkString);
                }

                let length = rest
                    .parse::<usize>()
                    .map_err(|_| RespError::InvalidBulkString)?;

                let payload = read_exact(cursor, length)?;
                let terminator = read_exact(cursor, 2)?;

                if terminator != b"\r\n" {
                    return Err(RespError::InvalidBulkString);
                }

                let content = std::str::from_utf8(payload).map_err(|_| RespError::InvalidUtf8)?;

                Ok(RespValue::BulkString(content.to_string()))
            }
            b'*' => {
                if rest == "-1" {
                    return Ok(RespValue::NullArray);
                }

                let length = rest.parse::<usize>().map_err(|_| RespError::InvalidArray)?;

                // The declared length is client-controlled; cap the preallocation.
                let mut elements = Vec::with_capacity(length.min(64));

                for _ in 0..length {
                    elements.push(Self::parse(cursor)?);
                }

                Ok(RespValue::Array(elements))
            }
            _ => Err(RespError::UnknownRespType),
        }
    }

    /// Serializes the value into its RESP wire representation.
    pub fn encode(&self) -> String {
        match self {
            RespValue::SimpleString(content) => format!("+{}\r\n", content),
            RespValue::Error(message) => format!("-{}\r\n", message),
            RespValue::Integer(number) => format!(":{}\r\n", number),
            RespValue::BulkString(content) => format!("${}\r\n{}\r\n", content.len(), content),
            RespValue::NullBulkString => "$-1\r\n".to_string(),
            RespValue::Array(elements) => {
                let mut encoded = format!("*{}\r\n", elements.len());

                for element in elements {
                    encoded.push_str(&element.encode());
                }

                encoded
            }
            RespValue::NullArray => "*-1\r\n".to_string(),
        }
    }

    /// Encodes a flat array of bulk strings, the reply shape shared by
    /// LRANGE, LPOP with count and BLPOP.
    pub fn encode_array_from_strings(values: Vec<String>) -> String {
        RespValue::Array(values.into_iter().map(RespValue::BulkString).collect()).encode()
    }
}

fn read_line<'a>(cursor: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], RespError> {
    let start = cursor.position() as usize;
    let data = *cursor.get_ref();

    let Some(offset) = data[start..]
        .windows(2)
        .position(|window| window == b"\r\n")
    else {
        return Err(RespError::Incomplete);
    };

    cursor.set_position((start + offset + 2) as u64);

    Ok(&data[start..start + offset])
}

fn read_exact<'a>(cursor: &mut Cursor<&'a [u8]>, length: usize) -> Result<&'a [u8], RespError> {
    let start = cursor.position() as usize;
    let data = *cursor.get_ref();

    if data.len() - start < length {
        return Err(RespError::Incomplete);
    }

    cursor.set_position((start + length) as u64);

    Ok(&data[start..start + length])
}
