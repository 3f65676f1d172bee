use thiserror::Error;

use crate::resp::RespValue;

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("invalid command")]
    InvalidCommand,
    #[error("invalid command argument")]
    InvalidCommandArgument,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("wrong number of arguments for '{0}' command")]
    WrongNumberOfArguments(&'static str),
    #[error("syntax error")]
    SyntaxError,
    #[error("value is not an integer or out of range")]
    NotAnInteger,
    #[error("value is out of range, must be positive")]
    NegativeCount,
    #[error("timeout is not a float or out of range")]
    InvalidBlockTimeout,
    #[error("timeout is negative")]
    NegativeBlockTimeout,
    #[error("Unbalanced XREAD list of streams: for each stream key an ID must be specified")]
    UnbalancedXread,
    #[error("{0}")]
    InvalidStreamId(String),
    #[error("wrong kind of value")]
    WrongType,
}

impl CommandError {
    /// RESP encoding of the error, ready to be written back to the client.
    ///
    /// Wrong-kind failures carry the WRONGTYPE prefix; everything else is a
    /// generic ERR reply built from the error's display text.
    pub fn as_string(&self) -> String {
        match self {
            CommandError::WrongType => RespValue::Error(
                "WRONGTYPE Operation against a key holding the wrong kind of value".to_string(),
            )
            .encode(),
            other => RespValue::Error(format!("ERR {}", other)).encode(),
        }
    }
}
