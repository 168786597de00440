//! Bridge: the injection bootstrap
//!
//! Owns the one `WalletProvider` instance and the discovery protocol, and
//! is the single consumer of the task queue.
//!
//! ```text
//! host frame ─┐
//! timer     ──┼──▶ TaskQueue ──▶ Bridge::handle ──┬──▶ RpcClient::settle  (column:response)
//! page event ─┘                                   ├──▶ WalletProvider::apply_event (column:event)
//!                                                 └──▶ Discovery::on_timer / on_handshake
//! ```

use std::rc::Rc;

use crate::config::BridgeConfig;
use crate::core::codec::{self, InboundMessage};
use crate::discovery::{Discovery, Page};
use crate::provider::WalletProvider;
use crate::queue::{task_queue, Task, TaskQueue, TaskReceiver};
use crate::rpc::RpcClient;
use crate::transport::Transport;

pub struct Bridge<P: Page> {
    provider: WalletProvider,
    discovery: Discovery<P>,
    queue: TaskQueue,
}

impl<P: Page> Bridge<P> {
    /// `origin` is the page origin; `config.origin` overrides it
    pub fn new(config: &BridgeConfig, transport: Rc<dyn Transport>, page: P, origin: &str) -> (Self, TaskReceiver) {
        let origin = config.origin.as_deref().unwrap_or(origin);
        let rpc = RpcClient::new(transport, origin);
        let (queue, rx) = task_queue();
        let provider = WalletProvider::new(rpc.clone(), config);
        let discovery = Discovery::new(page, queue.clone(), rpc, config);
        tracing::info!(wallet = %config.wallet.name, origin, "bridge created");
        (Self { provider, discovery, queue }, rx)
    }

    pub fn provider(&self) -> &WalletProvider {
        &self.provider
    }

    pub fn discovery(&self) -> &Discovery<P> {
        &self.discovery
    }

    /// Producer handle for transport and page callbacks
    pub fn queue(&self) -> TaskQueue {
        self.queue.clone()
    }

    pub fn start(&self) {
        self.discovery.start();
    }

    pub fn handle(&self, task: Task) {
        match task {
            Task::Inbound(raw) => self.handle_inbound(&raw),
            Task::Announce { attempt } => self.discovery.on_timer(attempt),
            Task::Handshake { event, payload } => self.discovery.on_handshake(&event, payload.as_ref()),
        }
    }

    pub fn handle_inbound(&self, raw: &str) {
        match codec::decode(raw) {
            Some(InboundMessage::Response { id, result, error }) => {
                self.provider.rpc().settle(id, result, error);
            }
            Some(InboundMessage::Event { event, data }) => {
                self.provider.apply_event(&event, &data);
            }
            Some(InboundMessage::Unrecognized) | None => {
                tracing::trace!(len = raw.len(), "ignoring non-bridge message");
            }
        }
    }

    /// Apply everything queued so far; returns the number of tasks handled
    pub fn drain(&self, rx: &mut TaskReceiver) -> usize {
        let mut handled = 0;
        while let Some(task) = rx.try_next() {
            self.handle(task);
            handled += 1;
        }
        handled
    }

    /// Consumer loop for the page lifetime
    pub async fn run(self: Rc<Self>, mut rx: TaskReceiver) {
        while let Some(task) = rx.next().await {
            self.handle(task);
        }
        tracing::info!("bridge task queue closed");
    }
}
