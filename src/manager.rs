//! Instance registry and inbound command dispatch.
//!
//! A [`ProviderManager`] serves one provider type for the lifetime of the
//! worker. It turns `retrieveUrls` commands into provider instances, fans
//! `stopDownloads` out to every live instance, and owns the state those
//! instances share: the filter flag, the rate-limit cooldown and the fuzzy
//! matcher. Everything instances report goes out through the single outbound
//! channel handed to the manager at construction.
//!
//! # Concurrency
//!
//! Commands are dispatched one at a time, in arrival order. Providers may run
//! their own tasks and call back into their [`ProviderProxy`] from them;
//! the registry is never locked while provider code runs, so a provider may
//! call [`ProviderProxy::completed`] from inside
//! [`retrieve_urls`](Provider::retrieve_urls).
//!
//! # Examples
//!
//! ```rust
//! use provider_worker::prelude::*;
//! use serde_json::json;
//! use tokio::sync::mpsc;
//!
//! struct EchoProvider {
//!     proxy: ProviderProxy,
//! }
//!
//! impl Provider for EchoProvider {
//!     fn retrieve_urls(&mut self) {
//!         self.proxy.image(ImageContent::new(format!("https://cdn.example.com/{}", self.proxy.id())));
//!         self.proxy.completed();
//!     }
//!
//!     fn stop_url_download(&mut self) {}
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
//! let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
//!
//! let manager = ProviderManager::new("Echo", |proxy| EchoProvider { proxy }, outbound_tx);
//! manager.listen(inbound_rx);
//!
//! inbound_tx
//!     .send(json!({
//!         "event": "retrieveUrls",
//!         "data": { "id": "1", "title": "Celeste", "path": "/games/celeste", "imageType": "poster" }
//!     }))
//!     .unwrap();
//!
//! let first = outbound_rx.recv().await.unwrap();
//! assert_eq!(first.event_name(), "image");
//! let second = outbound_rx.recv().await.unwrap();
//! assert_eq!(second.event_name(), "completed");
//! assert!(manager.is_empty());
//! # }
//! ```

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::{
    error::{Error, Result},
    fuzzy::{FuzzyCallback, FuzzyMatcher, TitleMatcher},
    message::{InboundMessage, OutboundMessage},
    provider::{Provider, ProviderProxy},
    rate_limit::RateLimiter,
    types::{ManagerConfig, RetrieveRequest},
};

type ProviderFactory = Box<dyn Fn(ProviderProxy) -> Box<dyn Provider> + Send + Sync>;

/// One registered provider run, keyed by its request id.
pub struct ProviderInstance {
    id: String,
    provider: Mutex<Box<dyn Provider>>,
}

impl ProviderInstance {
    /// Request id the instance is registered under.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Calls [`Provider::retrieve_urls`] on the wrapped provider.
    pub fn retrieve_urls(&self) {
        self.provider.lock().retrieve_urls();
    }

    /// Calls [`Provider::stop_url_download`] on the wrapped provider.
    pub fn stop_url_download(&self) {
        self.provider.lock().stop_url_download();
    }
}

impl std::fmt::Debug for ProviderInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderInstance")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Shared state behind a manager and all of its proxies.
pub(crate) struct ManagerCore {
    provider_name: Arc<str>,
    filter_enabled: AtomicBool,
    rate_limiter: RateLimiter,
    fuzzy_matcher: Arc<dyn FuzzyMatcher>,
    instances: Mutex<HashMap<String, Arc<ProviderInstance>>>,
    outbound: UnboundedSender<OutboundMessage>,
    factory: ProviderFactory,
    listening: AtomicBool,
}

fn send_outbound(outbound: &UnboundedSender<OutboundMessage>, message: OutboundMessage) -> Result<()> {
    let event = message.event_name();
    match outbound.send(message) {
        Ok(()) => {
            tracing::trace!(event, "Outbound message posted");
            Ok(())
        }
        Err(_) => Err(Error::ChannelClosed),
    }
}

impl ManagerCore {
    pub(crate) fn filter_enabled(&self) -> bool {
        self.filter_enabled.load(Ordering::Acquire)
    }

    pub(crate) fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub(crate) fn post_message(&self, message: OutboundMessage) {
        let event = message.event_name();
        if send_outbound(&self.outbound, message).is_err() {
            tracing::warn!(event, provider = %self.provider_name, "Outbound channel closed, message dropped");
        }
    }

    pub(crate) fn remove_instance(&self, id: &str) -> bool {
        // Released after the guard so a provider's Drop can call back in.
        let old = self.instances.lock().remove(id);
        let removed = old.is_some();
        drop(old);
        if removed {
            tracing::debug!(id, provider = %self.provider_name, "Provider instance removed");
        }
        removed
    }

    fn new_instance(self: &Arc<Self>, request: RetrieveRequest) -> Arc<ProviderInstance> {
        let id = request.id.clone();
        let proxy = ProviderProxy::new(
            request,
            self.provider_name.clone(),
            self.fuzzy_matcher.clone(),
            Arc::downgrade(self),
        );

        let instance = Arc::new(ProviderInstance {
            id: id.clone(),
            provider: Mutex::new((self.factory)(proxy)),
        });

        let old = self.instances.lock().insert(id.clone(), instance.clone());
        let replaced = old.is_some();
        drop(old);

        if replaced {
            tracing::debug!(id = %id, provider = %self.provider_name, "Replaced in-flight provider instance");
        } else {
            tracing::debug!(id = %id, provider = %self.provider_name, "Provider instance created");
        }

        instance
    }

    fn snapshot(&self) -> Vec<Arc<ProviderInstance>> {
        self.instances.lock().values().cloned().collect()
    }

    fn dispatch(self: &Arc<Self>, message: InboundMessage) {
        tracing::debug!(command = message.command(), provider = %self.provider_name, "Dispatching inbound command");

        match message {
            InboundMessage::FuzzyList { list } => self.fuzzy_matcher.set_fuzzy_list(list),
            InboundMessage::RetrieveUrls(request) => self.new_instance(request).retrieve_urls(),
            InboundMessage::StopDownloads => {
                for instance in self.snapshot() {
                    instance.stop_url_download();
                }
            }
            InboundMessage::ToggleFiltering { enable } => {
                self.filter_enabled.store(enable, Ordering::Release)
            }
        }
    }

    fn handle_value(self: &Arc<Self>, value: &Value) {
        match InboundMessage::from_value(value) {
            Some(message) => self.dispatch(message),
            None => tracing::debug!(provider = %self.provider_name, "Ignoring unrecognized inbound message"),
        }
    }
}

/// Coordinates every instance of one provider type.
///
/// Cloning is cheap; clones share the same registry and state.
#[derive(Clone)]
pub struct ProviderManager {
    core: Arc<ManagerCore>,
}

impl ProviderManager {
    /// Creates a manager named `provider_name` with the default [`TitleMatcher`].
    ///
    /// `factory` builds one provider per `retrieveUrls` command from the
    /// proxy bound to that request.
    pub fn new<P, F>(
        provider_name: impl Into<String>,
        factory: F,
        outbound: UnboundedSender<OutboundMessage>,
    ) -> Self
    where
        P: Provider + 'static,
        F: Fn(ProviderProxy) -> P + Send + Sync + 'static,
    {
        Self::with_config(
            ManagerConfig::from(provider_name.into()),
            factory,
            TitleMatcher::new,
            outbound,
        )
    }

    /// Creates a manager from a full [`ManagerConfig`] and a fuzzy matcher
    /// factory.
    ///
    /// `matcher_factory` is called once, with the callback through which the
    /// matcher's events reach the host as `fuzzyEvent` messages.
    pub fn with_config<P, F, M, MF>(
        config: ManagerConfig,
        factory: F,
        matcher_factory: MF,
        outbound: UnboundedSender<OutboundMessage>,
    ) -> Self
    where
        P: Provider + 'static,
        F: Fn(ProviderProxy) -> P + Send + Sync + 'static,
        M: FuzzyMatcher + 'static,
        MF: FnOnce(FuzzyCallback) -> M,
    {
        let fuzzy_outbound = outbound.clone();
        let callback: FuzzyCallback = Arc::new(move |event| {
            if send_outbound(&fuzzy_outbound, OutboundMessage::FuzzyEvent(event)).is_err() {
                tracing::warn!("Outbound channel closed, fuzzy event dropped");
            }
        });

        let core = ManagerCore {
            provider_name: Arc::from(config.provider_name),
            filter_enabled: AtomicBool::new(config.filter_enabled),
            rate_limiter: RateLimiter::new(),
            fuzzy_matcher: Arc::new(matcher_factory(callback)),
            instances: Mutex::new(HashMap::new()),
            outbound,
            factory: Box::new(move |proxy| Box::new(factory(proxy)) as Box<dyn Provider>),
            listening: AtomicBool::new(false),
        };

        Self {
            core: Arc::new(core),
        }
    }

    /// Starts dispatching commands received on `inbound`.
    ///
    /// Only the first call subscribes; later calls return `None`. The
    /// returned task ends once every sender of `inbound` is dropped. Must be
    /// called from within a tokio runtime.
    pub fn listen(&self, mut inbound: UnboundedReceiver<Value>) -> Option<JoinHandle<()>> {
        if self.core.listening.swap(true, Ordering::AcqRel) {
            tracing::warn!(provider = %self.core.provider_name, "Manager is already listening");
            return None;
        }

        let core = self.core.clone();
        Some(tokio::spawn(async move {
            while let Some(value) = inbound.recv().await {
                core.handle_value(&value);
            }
            tracing::debug!(provider = %core.provider_name, "Inbound channel closed");
        }))
    }

    /// Whether [`listen`](ProviderManager::listen) has already subscribed.
    pub fn is_listening(&self) -> bool {
        self.core.listening.load(Ordering::Acquire)
    }

    /// Decodes and dispatches one raw inbound message. Messages that are not
    /// a known command are ignored.
    pub fn handle_value(&self, value: &Value) {
        self.core.handle_value(value);
    }

    /// Dispatches one decoded command.
    pub fn dispatch(&self, message: InboundMessage) {
        self.core.dispatch(message);
    }

    /// Registers a provider instance for `request`, replacing any instance
    /// already registered under the same id, and returns it. The instance is
    /// not started.
    pub fn new_instance(&self, request: RetrieveRequest) -> Arc<ProviderInstance> {
        self.core.new_instance(request)
    }

    /// Removes the instance registered under `id`. Returns whether one was
    /// removed.
    pub fn remove_instance(&self, id: &str) -> bool {
        self.core.remove_instance(id)
    }

    /// Emits `message` on the outbound channel, dropping it if the receiver
    /// is gone.
    pub fn post_message(&self, message: OutboundMessage) {
        self.core.post_message(message);
    }

    /// Emits `message` on the outbound channel.
    pub fn try_post_message(&self, message: OutboundMessage) -> Result<()> {
        send_outbound(&self.core.outbound, message)
    }

    /// Starts the shared cooldown unless one is already running. Returns
    /// whether this call started it.
    pub fn timeout(&self, duration: Duration) -> bool {
        self.core.rate_limiter.trigger(duration)
    }

    /// Whether the shared cooldown is currently running.
    pub fn is_rate_limited(&self) -> bool {
        self.core.rate_limiter.is_limited()
    }

    /// Current value of the shared filter flag, as last set by
    /// `toggleFiltering`.
    pub fn filter_enabled(&self) -> bool {
        self.core.filter_enabled()
    }

    /// Name reported in `timeout` and `error` events.
    pub fn provider_name(&self) -> &str {
        &self.core.provider_name
    }

    /// The fuzzy matcher shared by every instance of this manager.
    pub fn fuzzy_matcher(&self) -> Arc<dyn FuzzyMatcher> {
        self.core.fuzzy_matcher.clone()
    }

    /// Returns the instance registered under `id`.
    pub fn instance(&self, id: &str) -> Option<Arc<ProviderInstance>> {
        self.core.instances.lock().get(id).cloned()
    }

    /// Whether an instance is registered under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.core.instances.lock().contains_key(id)
    }

    /// Ids of all registered instances, in no particular order.
    pub fn instance_ids(&self) -> Vec<String> {
        self.core.instances.lock().keys().cloned().collect()
    }

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        self.core.instances.lock().len()
    }

    /// Returns `true` if no instance is registered.
    pub fn is_empty(&self) -> bool {
        self.core.instances.lock().is_empty()
    }
}

impl std::fmt::Debug for ProviderManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderManager")
            .field("provider_name", &self.core.provider_name)
            .field("filter_enabled", &self.filter_enabled())
            .field("rate_limited", &self.is_rate_limited())
            .field("instances", &self.len())
            .finish()
    }
}
