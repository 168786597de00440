//! Event emitter: in-page pub/sub for host push notifications
//!
//! Listeners fire in subscription order. Each invocation is isolated: an
//! `Err` from one listener is logged and the rest still run. Emission
//! walks a snapshot, so listeners may subscribe or dispose while it runs.
//!
//! Two subscription flavours share one listener table:
//! - `subscribe` (standardized `standard:events` API) returns a `Disposer`
//! - `subscribe_legacy` returns nothing; those listeners live for the page
//!
//! Only legacy subscriptions are deduplicated by callback identity. Every
//! `subscribe` gets its own entry, so a disposer never reaches another
//! subscription.

use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

pub type Listener = Rc<dyn Fn(&Value) -> anyhow::Result<()>>;

/// Wrap a closure as a `Listener`
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&Value) -> anyhow::Result<()> + 'static,
{
    Rc::new(f)
}

struct Entry {
    id: u64,
    legacy: bool,
    listener: Listener,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    listeners: HashMap<String, Vec<Entry>>,
}

#[derive(Clone, Default)]
pub struct EventEmitter {
    inner: Rc<RefCell<Inner>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, event: &str, listener: Listener) -> Disposer {
        let id = self.add(event, listener, false);
        Disposer { inner: Rc::downgrade(&self.inner), event: event.to_string(), id }
    }

    pub fn subscribe_legacy(&self, event: &str, listener: Listener) {
        self.add(event, listener, true);
    }

    fn add(&self, event: &str, listener: Listener, legacy: bool) -> u64 {
        let mut inner = self.inner.borrow_mut();
        let next_id = inner.next_id;
        let entries = inner.listeners.entry(event.to_string()).or_default();

        // Same legacy callback is kept once per event.
        if legacy {
            if let Some(existing) = entries.iter().find(|e| e.legacy && same_listener(&e.listener, &listener)) {
                return existing.id;
            }
        }

        entries.push(Entry { id: next_id, legacy, listener });
        inner.next_id += 1;
        next_id
    }

    /// Invoke every listener for `event`; returns how many ran
    pub fn emit(&self, event: &str, payload: &Value) -> usize {
        let snapshot: Vec<Listener> = {
            let inner = self.inner.borrow();
            match inner.listeners.get(event) {
                Some(entries) => entries.iter().map(|e| e.listener.clone()).collect(),
                None => return 0,
            }
        };

        for listener in &snapshot {
            if let Err(e) = listener(payload) {
                tracing::warn!(event, error = %e, "listener failed");
            }
        }
        snapshot.len()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.inner.borrow().listeners.get(event).map_or(0, Vec::len)
    }
}

fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

/// Removes exactly one subscription. Dropping it without calling
/// `dispose` keeps the listener registered.
pub struct Disposer {
    inner: Weak<RefCell<Inner>>,
    event: String,
    id: u64,
}

impl Disposer {
    /// Idempotent; returns whether a listener was removed
    pub fn dispose(&self) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        let mut inner = inner.borrow_mut();
        let Some(entries) = inner.listeners.get_mut(&self.event) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.id != self.id);
        before != entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    fn recorder(log: &Rc<RefCell<Vec<String>>>, tag: &str) -> Listener {
        let log = log.clone();
        let tag = tag.to_string();
        listener(move |payload| {
            log.borrow_mut().push(format!("{}:{}", tag, payload));
            Ok(())
        })
    }

    #[test]
    fn fires_in_subscription_order() {
        let emitter = EventEmitter::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        emitter.subscribe_legacy("accountChange", recorder(&log, "a"));
        emitter.subscribe_legacy("accountChange", recorder(&log, "b"));

        assert_eq!(emitter.emit("accountChange", &json!(1)), 2);
        assert_eq!(*log.borrow(), vec!["a:1", "b:1"]);
    }

    #[test]
    fn failing_listener_is_isolated() {
        let emitter = EventEmitter::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        emitter.subscribe_legacy("x", listener(|_| Err(anyhow::anyhow!("boom"))));
        emitter.subscribe_legacy("x", recorder(&log, "after"));

        emitter.emit("x", &json!(null));
        assert_eq!(*log.borrow(), vec!["after:null"]);
    }

    #[test]
    fn disposer_removes_only_its_listener() {
        let emitter = EventEmitter::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let first = emitter.subscribe("change", recorder(&log, "first"));
        emitter.subscribe("change", recorder(&log, "second"));

        assert!(first.dispose());
        assert!(!first.dispose());
        emitter.emit("change", &json!(0));
        assert_eq!(*log.borrow(), vec!["second:0"]);
    }

    #[test]
    fn same_callback_identity_is_kept_once() {
        let emitter = EventEmitter::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let cb = recorder(&log, "cb");
        emitter.subscribe_legacy("e", cb.clone());
        emitter.subscribe_legacy("e", cb.clone());
        emitter.subscribe_legacy("e", recorder(&log, "other"));

        assert_eq!(emitter.listener_count("e"), 2);
    }

    #[test]
    fn disposer_never_reaches_legacy_or_sibling_entries() {
        let emitter = EventEmitter::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let cb = recorder(&log, "cb");
        emitter.subscribe_legacy("accountChange", cb.clone());
        let first = emitter.subscribe("accountChange", cb.clone());
        let second = emitter.subscribe("accountChange", cb.clone());
        assert_eq!(emitter.listener_count("accountChange"), 3);

        assert!(first.dispose());
        emitter.emit("accountChange", &json!(1));
        assert_eq!(*log.borrow(), vec!["cb:1", "cb:1"]);

        assert!(second.dispose());
        emitter.emit("accountChange", &json!(2));
        assert_eq!(log.borrow().len(), 3);
        assert_eq!(emitter.listener_count("accountChange"), 1);
    }

    #[test]
    fn subscribing_during_emit_applies_next_time() {
        let emitter = EventEmitter::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner_emitter = emitter.clone();
        let inner_log = log.clone();
        emitter.subscribe_legacy("e", listener(move |_| {
            inner_emitter.subscribe_legacy("e", recorder(&inner_log, "late"));
            Ok(())
        }));

        assert_eq!(emitter.emit("e", &json!(1)), 1);
        assert!(log.borrow().is_empty());
        emitter.emit("e", &json!(2));
        assert_eq!(*log.borrow(), vec!["late:2"]);
    }

    #[test]
    fn emit_without_listeners_is_noop() {
        let emitter = EventEmitter::new();
        assert_eq!(emitter.emit("nothing", &json!({})), 0);
    }
}
