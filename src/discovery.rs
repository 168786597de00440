//! Discovery: announce the wallet to page code
//!
//! ```text
//! Uninitialized ──start()──▶ Announcing ──last retry fired──▶ Steady
//!                   │
//!                   ├── listen  wallet-standard:app-ready        (page-initiated)
//!                   ├── listen  wallet-standard:register-wallet  (our own event name)
//!                   ├── assign  window.column / .aptos / .petra
//!                   ├── dispatch wallet-standard:register-wallet  (now + each delay)
//!                   └── dispatch aptos#initialized, column#initialized
//! ```
//!
//! Every compatibility path is isolated: a failure is logged (locally and
//! as a host diagnostic) and the remaining paths still run. Calling
//! `start` again repeats the dispatches but never adds listeners or timers.

use serde_json::json;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config::BridgeConfig;
use crate::core::names::discovery as names;
use crate::error::PageError;
use crate::queue::{Task, TaskQueue};
use crate::rpc::RpcClient;

/// Payload carried by a page discovery event
pub trait HandshakePayload {
    /// Convention 1: `{ register(wallet) }`. `None` if the shape differs.
    fn register_wallet(&self) -> Option<Result<(), PageError>>;
    /// Convention 2: the payload is a callback taking `{ register }`. `None` if not callable.
    fn invoke_callback(&self) -> Option<Result<(), PageError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    RegisterObject,
    Callback,
}

impl Convention {
    pub const ORDER: [Convention; 2] = [Convention::RegisterObject, Convention::Callback];

    pub fn as_str(&self) -> &'static str {
        match self {
            Convention::RegisterObject => "register-object",
            Convention::Callback => "callback",
        }
    }
}

/// Try each convention in order; the first matching shape wins
pub fn run_handshake(payload: &dyn HandshakePayload) -> Option<(Convention, Result<(), PageError>)> {
    Convention::ORDER.into_iter().find_map(|convention| {
        let outcome = match convention {
            Convention::RegisterObject => payload.register_wallet(),
            Convention::Callback => payload.invoke_callback(),
        };
        outcome.map(|result| (convention, result))
    })
}

/// The page environment: DOM events, globals and timers
pub trait Page {
    /// Dispatch the announcement event; its detail registers this wallet
    fn announce(&self, event: &str) -> Result<(), PageError>;
    /// Dispatch a plain event with no detail
    fn dispatch(&self, event: &str) -> Result<(), PageError>;
    /// Make `window[name]` alias the wallet object
    fn assign_global(&self, name: &str) -> Result<(), PageError>;
    /// Forward every `event` to the queue as `Task::Handshake`
    fn listen(&self, event: &str, queue: TaskQueue) -> Result<(), PageError>;
    /// Push `task` onto the queue after `delay_ms`
    fn schedule(&self, delay_ms: u32, task: Task, queue: TaskQueue) -> Result<(), PageError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Announcing,
    Steady,
}

pub struct Discovery<P: Page> {
    page: P,
    queue: TaskQueue,
    reporter: RpcClient,
    global_names: Vec<String>,
    legacy_events: Vec<String>,
    delays_ms: Vec<u32>,
    phase: Cell<Phase>,
    outstanding: Cell<usize>,
    announcements: Cell<usize>,
}

impl<P: Page> Discovery<P> {
    pub fn new(page: P, queue: TaskQueue, reporter: RpcClient, config: &BridgeConfig) -> Self {
        Self {
            page,
            queue,
            reporter,
            global_names: config.global_names.clone(),
            legacy_events: config.legacy_events.clone(),
            delays_ms: config.announce_delays_ms.clone(),
            phase: Cell::new(Phase::Uninitialized),
            outstanding: Cell::new(0),
            announcements: Cell::new(0),
        }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    /// Announcement dispatches attempted so far
    pub fn announcements(&self) -> usize {
        self.announcements.get()
    }

    pub fn start(&self) {
        if self.phase.get() != Phase::Uninitialized {
            tracing::debug!("discovery already started, re-dispatching only");
            self.broadcast();
            return;
        }

        for event in [names::APP_READY, names::REGISTER_WALLET] {
            let result = self.page.listen(event, self.queue.clone());
            self.guard("listen", event, result);
        }

        self.phase.set(Phase::Announcing);
        self.broadcast();

        let mut scheduled = 0;
        for (attempt, delay) in self.delays_ms.iter().copied().enumerate() {
            let result = self.page.schedule(delay, Task::Announce { attempt }, self.queue.clone());
            if result.is_ok() {
                scheduled += 1;
            }
            self.guard("schedule", &format!("retry #{}", attempt), result);
        }
        self.outstanding.set(scheduled);
        if scheduled == 0 {
            self.phase.set(Phase::Steady);
        }
        tracing::info!(retries = scheduled, "discovery announcing");
    }

    /// Globals, announcement and legacy events, each isolated
    fn broadcast(&self) {
        for name in &self.global_names {
            let result = self.page.assign_global(name);
            self.guard("assign_global", name, result);
        }
        self.announce();
        for event in &self.legacy_events {
            let result = self.page.dispatch(event);
            self.guard("dispatch", event, result);
        }
    }

    fn announce(&self) {
        self.announcements.set(self.announcements.get() + 1);
        let result = self.page.announce(names::REGISTER_WALLET);
        self.guard("announce", names::REGISTER_WALLET, result);
    }

    /// A scheduled re-announcement fired
    pub fn on_timer(&self, attempt: usize) {
        self.announce();
        let left = self.outstanding.get().saturating_sub(1);
        self.outstanding.set(left);
        if left == 0 && self.phase.get() == Phase::Announcing {
            tracing::debug!(attempt, "discovery steady");
            self.phase.set(Phase::Steady);
        }
    }

    /// Page raised a discovery event carrying `payload`
    pub fn on_handshake(&self, event: &str, payload: &dyn HandshakePayload) {
        match run_handshake(payload) {
            Some((convention, result)) => {
                tracing::debug!(event, convention = convention.as_str(), "handshake");
                self.guard("handshake", event, result);
            }
            None => tracing::trace!(event, "handshake payload not callable, ignored"),
        }
    }

    fn guard(&self, path: &str, target: &str, result: Result<(), PageError>) {
        if let Err(e) = result {
            tracing::warn!(path, target, error = %e, "compat path failed");
            self.reporter.log("discovery path failed", json!({ "path": path, "target": target, "error": e.to_string() }));
        }
    }
}

// =============================================================================
// IN-MEMORY PAGE (CLI simulator, tests)
// =============================================================================

/// Records every page action as a string (`announce:<event>`,
/// `dispatch:<event>`, `global:<name>`, `listen:<event>`). Timers are held
/// until `fire_timers`.
#[derive(Clone, Default)]
pub struct MemoryPage {
    actions: Rc<RefCell<Vec<String>>>,
    listeners: Rc<RefCell<Vec<(String, TaskQueue)>>>,
    timers: Rc<RefCell<Vec<(u32, Task, TaskQueue)>>>,
    failing: Rc<RefCell<Vec<String>>>,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every action whose record starts with `prefix` fail
    pub fn fail_on(&self, prefix: &str) {
        self.failing.borrow_mut().push(prefix.to_string());
    }

    pub fn actions(&self) -> Vec<String> {
        self.actions.borrow().clone()
    }

    pub fn count(&self, action: &str) -> usize {
        self.actions.borrow().iter().filter(|a| a.as_str() == action).count()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn pending_timers(&self) -> Vec<u32> {
        self.timers.borrow().iter().map(|(delay, _, _)| *delay).collect()
    }

    /// Fire all held timers in delay order; returns how many fired
    pub fn fire_timers(&self) -> usize {
        let mut timers: Vec<_> = self.timers.borrow_mut().drain(..).collect();
        timers.sort_by_key(|(delay, _, _)| *delay);
        let fired = timers.len();
        for (_, task, queue) in timers {
            queue.push(task);
        }
        fired
    }

    /// Page code raises `event` with `payload`; returns listeners reached
    pub fn raise(&self, event: &str, payload: impl Fn() -> Box<dyn HandshakePayload>) -> usize {
        let listeners = self.listeners.borrow();
        let mut reached = 0;
        for (_, queue) in listeners.iter().filter(|(name, _)| name == event) {
            if queue.push(Task::Handshake { event: event.to_string(), payload: payload() }) {
                reached += 1;
            }
        }
        reached
    }

    fn record(&self, action: String) -> Result<(), String> {
        let failing = self.failing.borrow().iter().any(|prefix| action.starts_with(prefix.as_str()));
        self.actions.borrow_mut().push(action);
        if failing {
            Err("simulated page failure".to_string())
        } else {
            Ok(())
        }
    }
}

impl Page for MemoryPage {
    fn announce(&self, event: &str) -> Result<(), PageError> {
        self.record(format!("announce:{}", event))
            .map_err(|reason| PageError::Dispatch { event: event.into(), reason })
    }

    fn dispatch(&self, event: &str) -> Result<(), PageError> {
        self.record(format!("dispatch:{}", event))
            .map_err(|reason| PageError::Dispatch { event: event.into(), reason })
    }

    fn assign_global(&self, name: &str) -> Result<(), PageError> {
        self.record(format!("global:{}", name))
            .map_err(|reason| PageError::AssignGlobal { name: name.into(), reason })
    }

    fn listen(&self, event: &str, queue: TaskQueue) -> Result<(), PageError> {
        self.record(format!("listen:{}", event))
            .map_err(|reason| PageError::Listen { event: event.into(), reason })?;
        self.listeners.borrow_mut().push((event.to_string(), queue));
        Ok(())
    }

    fn schedule(&self, delay_ms: u32, task: Task, queue: TaskQueue) -> Result<(), PageError> {
        self.record(format!("schedule:{}", delay_ms))
            .map_err(|reason| PageError::Schedule { task: task.kind().to_string(), delay_ms, reason })?;
        self.timers.borrow_mut().push((delay_ms, task, queue));
        Ok(())
    }
}
