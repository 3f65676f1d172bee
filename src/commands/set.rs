use std::{sync::Arc, time::Duration};

use tokio::{sync::Mutex, time::Instant};

use crate::{
    commands::command_error::CommandError,
    key_value_store::{DataType, KeyValueStore, Value},
    resp::RespValue,
};

/// Represents the parsed arguments for the SET command.
pub struct SetArguments {
    key: String,
    value: String,
    /// Time to live requested via EX (seconds) or PX (milliseconds).
    expiry: Option<Duration>,
}

impl SetArguments {
    /// Parses command arguments into a `SetArguments` struct.
    ///
    /// Accepted shapes are `[key, value]` and `[key, value, EX|PX, amount]`;
    /// the option keyword is matched case-insensitively.
    ///
    /// # Returns
    ///
    /// * `Ok(SetArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::WrongNumberOfArguments)` - If fewer than 2
    ///   arguments are provided
    /// * `Err(CommandError::SyntaxError)` - If the option grammar does not
    ///   match (dangling keyword, unknown keyword, trailing arguments)
    /// * `Err(CommandError::NotAnInteger)` - If the expiry amount does not
    ///   parse as an unsigned integer
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::WrongNumberOfArguments("set"));
        }

        let expiry = match arguments.len() {
            2 => None,
            4 => {
                let amount = arguments[3]
                    .parse::<u64>()
                    .map_err(|_| CommandError::NotAnInteger)?;

                match arguments[2].to_uppercase().as_str() {
                    "EX" => Some(Duration::from_secs(amount)),
                    "PX" => Some(Duration::from_millis(amount)),
                    _ => return Err(CommandError::SyntaxError),
                }
            }
            _ => return Err(CommandError::SyntaxError),
        };

        Ok(Self {
            key: arguments[0].clone(),
            value: arguments[1].clone(),
            expiry,
        })
    }
}

/// Handles the SET command: stores a string value, replacing any prior value
/// of any kind, and sets or clears the expiry.
pub async fn set(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<String, CommandError> {
    let set_arguments = SetArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;
    store_guard.insert(
        set_arguments.key,
        Value {
            data: DataType::String(set_arguments.value),
            expiration: set_arguments.expiry.map(|expiry| Instant::now() + expiry),
        },
    );

    Ok(RespValue::SimpleString("OK".to_string()).encode())
}
