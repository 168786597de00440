//! Transport seam: "send string to host"
//!
//! The browser build posts through the webview's message channel
//! (`wasm::transport`). `MemoryTransport` keeps outbound frames in memory
//! for the CLI simulator and tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::TransportError;

/// Outbound half of the page/host channel
pub trait Transport {
    fn send(&self, raw: &str) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Rc<T> {
    fn send(&self, raw: &str) -> Result<(), TransportError> {
        (**self).send(raw)
    }
}

/// In-memory transport: queues frames until drained
#[derive(Clone, Default)]
pub struct MemoryTransport {
    frames: Rc<RefCell<VecDeque<String>>>,
    sent: Rc<Cell<usize>>,
    offline: Rc<Cell<bool>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a webview whose bridge is not (or no longer) injected
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    /// Take every frame sent since the last drain
    pub fn drain(&self) -> Vec<String> {
        self.frames.borrow_mut().drain(..).collect()
    }

    /// Total frames accepted over the transport's lifetime
    pub fn sent_count(&self) -> usize {
        self.sent.get()
    }
}

impl Transport for MemoryTransport {
    fn send(&self, raw: &str) -> Result<(), TransportError> {
        if self.offline.get() {
            return Err(TransportError("host channel not available".into()));
        }
        self.frames.borrow_mut().push_back(raw.to_string());
        self.sent.set(self.sent.get() + 1);
        Ok(())
    }
}
