use crate::{commands::command_error::CommandError, resp::RespValue};

pub fn ping(arguments: Vec<String>) -> Result<String, CommandError> {
    if !arguments.is_empty() {
        return Err(CommandError::WrongNumberOfArguments("ping"));
    }

    Ok(RespValue::SimpleString("PONG".to_string()).encode())
}
