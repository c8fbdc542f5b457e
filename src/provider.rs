//! Provider extension point and the proxy handed to each provider instance.
//!
//! A [`Provider`] is one run of a concrete image lookup strategy, bound to a
//! single request. The manager builds it from a factory, passing a
//! [`ProviderProxy`] that is the instance's only window onto the shared
//! state: the filter flag, the fuzzy matcher, the rate-limit cooldown and
//! the outbound channel.
//!
//! # Examples
//!
//! ```rust
//! use provider_worker::prelude::*;
//!
//! struct StaticProvider {
//!     proxy: ProviderProxy,
//! }
//!
//! impl Provider for StaticProvider {
//!     fn retrieve_urls(&mut self) {
//!         let url = format!("https://images.example.com/{}.jpg", self.proxy.title());
//!         self.proxy.image(ImageContent::new(url));
//!         self.proxy.completed();
//!     }
//!
//!     fn stop_url_download(&mut self) {}
//! }
//! ```

use std::sync::{Arc, Weak};
use std::time::Duration;

use crate::{
    fuzzy::FuzzyMatcher,
    manager::ManagerCore,
    message::{CompletedPayload, ErrorPayload, ImagePayload, OutboundMessage, TimeoutPayload},
    types::{ErrorCode, ImageContent, ImageProviderApis, RetrieveRequest},
};

/// Lifecycle contract every concrete provider implements.
///
/// Both methods are called from the manager's dispatch loop and must return
/// promptly; long running work belongs in a task the provider spawns itself,
/// holding a clone of its [`ProviderProxy`].
///
/// # Implementation Guidelines
///
/// - Report results with [`ProviderProxy::image`] and failures with
///   [`ProviderProxy::error`]
/// - Call [`ProviderProxy::timeout`] when the upstream throttles requests
/// - Always finish with [`ProviderProxy::completed`], which is the only way
///   an instance leaves the manager's registry
pub trait Provider: Send {
    /// Starts producing results for the bound request.
    fn retrieve_urls(&mut self);

    /// Best-effort request to stop.
    ///
    /// Must not remove the instance itself; a stopped provider is still
    /// expected to call [`ProviderProxy::completed`] eventually.
    fn stop_url_download(&mut self);
}

/// Restricted view of the manager bound to one provider instance.
///
/// Request parameters are fixed at construction. Every other read goes to
/// the owning manager, so a change to shared state (for example a
/// `toggleFiltering` command) is seen by all proxies at once. Clones refer to
/// the same instance and can be moved into the provider's own tasks.
///
/// Once the manager has been dropped, event methods become no-ops and
/// [`filter`](ProviderProxy::filter) reports `false`.
#[derive(Clone)]
pub struct ProviderProxy {
    request: Arc<RetrieveRequest>,
    provider_name: Arc<str>,
    fuzzy_matcher: Arc<dyn FuzzyMatcher>,
    manager: Weak<ManagerCore>,
}

impl ProviderProxy {
    pub(crate) fn new(
        request: RetrieveRequest,
        provider_name: Arc<str>,
        fuzzy_matcher: Arc<dyn FuzzyMatcher>,
        manager: Weak<ManagerCore>,
    ) -> Self {
        Self {
            request: Arc::new(request),
            provider_name,
            fuzzy_matcher,
            manager,
        }
    }

    /// Request id this proxy is bound to.
    pub fn id(&self) -> &str {
        &self.request.id
    }

    /// Title the images are looked up for.
    pub fn title(&self) -> &str {
        &self.request.title
    }

    /// Path of the item on disk.
    pub fn path(&self) -> &str {
        &self.request.path
    }

    /// Requested image kind, e.g. "poster".
    pub fn image_type(&self) -> &str {
        &self.request.image_type
    }

    /// API settings bundle sent with the request.
    pub fn image_provider_apis(&self) -> &ImageProviderApis {
        &self.request.image_provider_apis
    }

    /// Current value of the shared filter flag.
    pub fn filter(&self) -> bool {
        self.manager
            .upgrade()
            .is_some_and(|manager| manager.filter_enabled())
    }

    /// The fuzzy matcher shared by every instance of this manager.
    pub fn fuzzy_matcher(&self) -> Arc<dyn FuzzyMatcher> {
        self.fuzzy_matcher.clone()
    }

    /// Name of the owning manager, as reported in events.
    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    /// Whether the shared cooldown is currently running.
    pub fn is_rate_limited(&self) -> bool {
        self.manager
            .upgrade()
            .is_some_and(|manager| manager.rate_limiter().is_limited())
    }

    /// Starts the shared cooldown for `seconds` and reports it to the host.
    ///
    /// Does nothing while a cooldown is already running, so concurrent
    /// instances hitting the same limit produce a single `timeout` event.
    pub fn timeout(&self, seconds: u64) {
        let Some(manager) = self.manager.upgrade() else {
            return;
        };

        if manager.rate_limiter().trigger(Duration::from_secs(seconds)) {
            manager.post_message(OutboundMessage::Timeout(TimeoutPayload {
                provider: self.provider_name.to_string(),
                time: seconds,
                id: self.request.id.clone(),
            }));
        }
    }

    /// Reports a failure for this request. The instance stays registered.
    pub fn error(&self, error: impl Into<ErrorCode>) {
        self.post_error(error.into(), None);
    }

    /// Reports a failure caused by a specific URL. The instance stays registered.
    pub fn error_at(&self, error: impl Into<ErrorCode>, url: impl Into<String>) {
        self.post_error(error.into(), Some(url.into()));
    }

    fn post_error(&self, error: ErrorCode, url: Option<String>) {
        self.post(OutboundMessage::Error(ErrorPayload {
            error,
            title: self.request.title.clone(),
            provider: self.provider_name.to_string(),
            id: self.request.id.clone(),
            url,
        }));
    }

    /// Reports a found image. The instance stays registered.
    pub fn image(&self, content: ImageContent) {
        self.post(OutboundMessage::Image(ImagePayload {
            content,
            id: self.request.id.clone(),
        }));
    }

    /// Reports that the request is finished and removes this instance from
    /// the manager's registry.
    pub fn completed(&self) {
        let Some(manager) = self.manager.upgrade() else {
            return;
        };

        manager.post_message(OutboundMessage::Completed(CompletedPayload {
            title: self.request.title.clone(),
            id: self.request.id.clone(),
        }));
        manager.remove_instance(&self.request.id);
    }

    fn post(&self, message: OutboundMessage) {
        if let Some(manager) = self.manager.upgrade() {
            manager.post_message(message);
        }
    }
}

impl std::fmt::Debug for ProviderProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderProxy")
            .field("id", &self.request.id)
            .field("title", &self.request.title)
            .field("provider_name", &self.provider_name)
            .finish()
    }
}
