use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{
        blpop::blpop,
        command_error::CommandError,
        echo::echo,
        get::get,
        llen::llen,
        lpop::lpop,
        lrange::lrange,
        ping::ping,
        rpush_and_lpush::{lpush, rpush},
        set::set,
        type_command::type_command,
        xadd::xadd,
        xrange::xrange,
        xread::xread,
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
    state::State,
};

/// A parsed command frame: an uppercased command name plus its arguments.
///
/// Construction only validates the frame shape; arity and option grammar are
/// checked by each command's argument parser before storage is touched.
#[derive(Debug, PartialEq, Clone)]
pub struct CommandHandler {
    pub name: String,
    pub arguments: Vec<String>,
}

impl CommandHandler {
    /// Creates a new `CommandHandler` from a decoded RESP value.
    ///
    /// The value must be an array whose elements are all bulk strings; the
    /// first element is the command name, matched case-insensitively.
    ///
    /// # Returns
    ///
    /// * `Ok(CommandHandler)` - Successfully parsed command
    /// * `Err(CommandError::InvalidCommand)` - If the frame is not an array
    ///   of bulk strings
    /// * `Err(CommandError::InvalidCommandArgument)` - If the command name is
    ///   missing or not a bulk string
    pub fn new(input: &RespValue) -> Result<Self, CommandError> {
        let RespValue::Array(elements) = input else {
            return Err(CommandError::InvalidCommand);
        };

        let name = match elements.first() {
            Some(RespValue::BulkString(s)) => Ok(s.to_uppercase()),
            _ => Err(CommandError::InvalidCommandArgument),
        }?;

        let mut arguments: Vec<String> = Vec::with_capacity(elements.len().saturating_sub(1));

        for element in elements[1..].iter() {
            let arg = match element {
                RespValue::BulkString(s) => Ok(s.to_string()),
                _ => Err(CommandError::InvalidCommand),
            }?;
            arguments.push(arg);
        }

        Ok(Self { name, arguments })
    }

    /// Executes the command against the shared store and waiter registry and
    /// returns the RESP-encoded reply.
    ///
    /// Every command resolves to exactly one reply. BLPOP is the only
    /// command that may suspend beyond I/O; it parks the calling session
    /// until an element is delivered or its deadline passes.
    ///
    /// # Arguments
    ///
    /// * `client_address` - Identifies the session, used to track its waiter
    ///   registrations
    /// * `store` - The shared keyspace
    /// * `state` - The shared waiter registry
    pub async fn handle_command(
        &self,
        client_address: &str,
        store: Arc<Mutex<KeyValueStore>>,
        state: Arc<Mutex<State>>,
    ) -> Result<String, CommandError> {
        match self.name.as_str() {
            "PING" => ping(self.arguments.clone()),
            "ECHO" => echo(self.arguments.clone()),
            "GET" => get(store, self.arguments.clone()).await,
            "SET" => set(store, self.arguments.clone()).await,
            "RPUSH" => rpush(store, state, self.arguments.clone()).await,
            "LPUSH" => lpush(store, state, self.arguments.clone()).await,
            "LRANGE" => lrange(store, self.arguments.clone()).await,
            "LLEN" => llen(store, self.arguments.clone()).await,
            "LPOP" => lpop(store, self.arguments.clone()).await,
            "BLPOP" => blpop(client_address, store, state, self.arguments.clone()).await,
            "TYPE" => type_command(store, self.arguments.clone()).await,
            "XADD" => xadd(store, self.arguments.clone()).await,
            "XRANGE" => xrange(store, self.arguments.clone()).await,
            "XREAD" => xread(store, self.arguments.clone()).await,
            _ => Err(CommandError::UnknownCommand(self.name.clone())),
        }
    }
}
