use crate::{commands::command_error::CommandError, resp::RespValue};

pub fn echo(arguments: Vec<String>) -> Result<String, CommandError> {
    if arguments.len() != 1 {
        return Err(CommandError::WrongNumberOfArguments("echo"));
    }

    Ok(RespValue::BulkString(arguments[0].clone()).encode())
}
