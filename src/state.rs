use std::collections::{HashMap, VecDeque};

use tokio::sync::oneshot;

/// A client parked in BLPOP, waiting for an element on one list key.
///
/// The sender carries the element itself: a producer hands the popped value
/// directly to the waiter, so a handed-off element is never observable in
/// the list between the push and the wake-up.
#[derive(Debug)]
pub struct BlpopWaiter {
    pub client_address: String,
    pub sender: oneshot::Sender<String>,
}

/// Registry of blocked BLPOP clients, keyed by list key, in arrival order.
///
/// The registry is always manipulated while the store lock is held (store
/// lock first, then state lock), which makes register-then-check on the
/// consumer side and push-then-deliver on the producer side indivisible.
#[derive(Debug, Default)]
pub struct State {
    pub blpop_waiters: HashMap<String, VecDeque<BlpopWaiter>>,
}

impl State {
    pub fn new() -> Self {
        State {
            blpop_waiters: HashMap::new(),
        }
    }

    pub fn add_blpop_waiter(&mut self, key: String, waiter: BlpopWaiter) {
        self.blpop_waiters.entry(key).or_default().push_back(waiter);
    }

    pub fn remove_blpop_waiter(&mut self, key: &str, client_address: &str) {
        if let Some(queue) = self.blpop_waiters.get_mut(key) {
            queue.retain(|waiter| waiter.client_address != client_address);

            if queue.is_empty() {
                self.blpop_waiters.remove(key);
            }
        }
    }

    pub fn has_blpop_waiters(&self, key: &str) -> bool {
        self.blpop_waiters
            .get(key)
            .is_some_and(|queue| !queue.is_empty())
    }

    /// Hands `value` to the oldest live waiter on `key`.
    ///
    /// Waiters whose receiving side is already gone (the client timed out or
    /// disconnected) are discarded and the next one is tried. When no live
    /// waiter accepts the element it is returned so the caller can put it
    /// back in the list.
    pub fn deliver_to_blpop_waiter(&mut self, key: &str, value: String) -> Result<(), String> {
        let mut undelivered = Some(value);

        if let Some(queue) = self.blpop_waiters.get_mut(key) {
            while let Some(element) = undelivered.take() {
                match queue.pop_front() {
                    Some(waiter) => undelivered = waiter.sender.send(element).err(),
                    None => {
                        undelivered = Some(element);
                        break;
                    }
                }
            }

            if queue.is_empty() {
                self.blpop_waiters.remove(key);
            }
        }

        match undelivered {
            None => Ok(()),
            Some(element) => Err(element),
        }
    }

    /// Drops every registration left behind by a disconnecting client.
    pub fn remove_client(&mut self, client_address: &str) {
        self.blpop_waiters.retain(|_, queue| {
            queue.retain(|waiter| waiter.client_address != client_address);
            !queue.is_empty()
        });
    }
}
