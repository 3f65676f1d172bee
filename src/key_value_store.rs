use std::collections::{HashMap, VecDeque};
use std::fmt;

use tokio::time::Instant;

/// A stream entry identifier. The derived ordering is lexicographic on
/// `(ms, seq)`, which is the ordering streams are kept in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StreamId {
    pub ms: u64,
    pub seq: u64,
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamEntry {
    pub id: StreamId,
    /// Field order is the argument order of the XADD that created the entry.
    pub fields: Vec<(String, String)>,
}

/// The three kinds a key can hold. A key holds exactly one kind at a time.
#[derive(Debug, PartialEq)]
pub enum DataType {
    String(String),
    Array(VecDeque<String>),
    Stream(Vec<StreamEntry>),
}

#[derive(Debug, PartialEq)]
pub struct Value {
    pub data: DataType,
    /// Only string values carry an expiry; lists and streams never expire.
    pub expiration: Option<Instant>,
}

impl Value {
    pub fn is_expired(&self) -> bool {
        self.expiration
            .is_some_and(|expiration| Instant::now() > expiration)
    }
}

pub type KeyValueStore = HashMap<String, Value>;

/// Looks up a key, first purging it when it holds an expired value.
///
/// Expiry is lazy: nothing sweeps the store in the background, so every
/// handler that distinguishes "absent" from "present with another kind" goes
/// through this lookup to make expired strings indistinguishable from
/// missing keys.
pub fn get_live_entry<'a>(store: &'a mut KeyValueStore, key: &str) -> Option<&'a mut Value> {
    if store.get(key).is_some_and(Value::is_expired) {
        store.remove(key);
    }

    store.get_mut(key)
}
