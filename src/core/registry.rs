//! Correlation registry: in-flight requests keyed by id
//!
//! `register` hands out a strictly increasing id and a `PendingCall`
//! future. The matching response settles it through `resolve`/`reject`,
//! which remove the entry first; settling an unknown id is a no-op so
//! duplicate or late responses are harmless.

use futures::channel::oneshot;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use crate::error::{BridgeError, BridgeResult};

type Settle = oneshot::Sender<BridgeResult<Value>>;

struct Inner {
    next_id: u64,
    pending: HashMap<u64, Settle>,
}

/// Shared handle; clones see the same pending table
#[derive(Clone)]
pub struct Registry {
    inner: Rc<RefCell<Inner>>,
}

impl Registry {
    pub fn new() -> Self {
        Self { inner: Rc::new(RefCell::new(Inner { next_id: 1, pending: HashMap::new() })) }
    }

    pub fn register(&self) -> (u64, PendingCall) {
        let (tx, rx) = oneshot::channel();
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.pending.insert(id, tx);
        (id, PendingCall { id, rx })
    }

    /// Returns whether a pending entry was settled
    pub fn resolve(&self, id: u64, result: Value) -> bool {
        self.settle(id, Ok(result))
    }

    pub fn reject(&self, id: u64, error: BridgeError) -> bool {
        self.settle(id, Err(error))
    }

    fn settle(&self, id: u64, outcome: BridgeResult<Value>) -> bool {
        // Release the borrow before the receiver can observe the value.
        let entry = self.inner.borrow_mut().pending.remove(&id);
        match entry {
            Some(tx) => {
                // Caller may have dropped its future; nothing to do then.
                let _ = tx.send(outcome);
                true
            }
            None => {
                tracing::debug!(id, "no pending request for response");
                false
            }
        }
    }

    pub fn is_pending(&self, id: u64) -> bool {
        self.inner.borrow().pending.contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.inner.borrow().pending.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Future for one correlated response
pub struct PendingCall {
    id: u64,
    rx: oneshot::Receiver<BridgeResult<Value>>,
}

impl PendingCall {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Future for PendingCall {
    type Output = BridgeResult<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let id = self.id;
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(BridgeError::Dropped(id))),
            Poll::Pending => Poll::Pending,
        }
    }
}
