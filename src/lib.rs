//! An in-memory key-value server speaking the RESP wire protocol.
//!
//! This crate implements a Redis-compatible subset over three value kinds:
//!
//! - Strings with expiry (GET, SET with EX/PX)
//! - Lists (RPUSH, LPUSH, LRANGE, LLEN, LPOP, BLPOP)
//! - Append-only streams (XADD, XRANGE, XREAD)
//! - Connection and introspection commands (PING, ECHO, TYPE)
//!
//! Clients talk RESP over TCP; each connection is served by its own Tokio
//! task. The keyspace and the registry of blocked BLPOP clients are shared
//! across sessions and guarded so that a push and the wake-up of a blocked
//! consumer form one atomic step.

pub mod commands;
pub mod connection;
pub mod key_value_store;
pub mod resp;
pub mod state;
