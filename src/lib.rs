//! # Provider Worker - message-driven router for image provider instances
//!
//! Provider Worker runs inside a background worker and coordinates short-lived
//! "provider" instances that look up images for metadata scraping requests.
//! The host talks to it over one inbound and one outbound channel; the
//! library creates and tears down one provider instance per request, forwards
//! everything the instances report, and keeps the state all instances of a
//! provider type share.
//!
//! ## Features
//!
//! - **Single Dispatch Point**: Commands are routed one at a time, in arrival order
//! - **Instance Registry**: One provider instance per in-flight request id
//! - **Shared Filter Flag**: Toggled by the host, read by every instance
//! - **Debounced Rate Limiting**: Concurrent `timeout` requests collapse into one cooldown
//! - **Fuzzy Matching**: One title matcher per provider type, its events relayed to the host
//!
//! ## Quick Start
//!
//! ```rust
//! use provider_worker::prelude::*;
//! use tokio::sync::mpsc;
//!
//! struct PosterProvider {
//!     proxy: ProviderProxy,
//! }
//!
//! impl Provider for PosterProvider {
//!     fn retrieve_urls(&mut self) {
//!         let proxy = self.proxy.clone();
//!         tokio::spawn(async move {
//!             // Look up images for proxy.title() here.
//!             proxy.image(ImageContent::new("https://images.example.com/poster.jpg"));
//!             proxy.completed();
//!         });
//!     }
//!
//!     fn stop_url_download(&mut self) {}
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (outbound_tx, _outbound_rx) = mpsc::unbounded_channel();
//! let (_inbound_tx, inbound_rx) = mpsc::unbounded_channel();
//!
//! let manager = ProviderManager::new("Posters", |proxy| PosterProvider { proxy }, outbound_tx);
//! manager.listen(inbound_rx);
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`manager`]: Instance registry, command dispatch and the listening task
//! - [`provider`]: The [`Provider`] extension point and its [`ProviderProxy`]
//! - [`message`]: Inbound commands and outbound events
//! - [`rate_limit`]: The shared, debounced cooldown
//! - [`fuzzy`]: The shared title matcher seam and a default implementation
//! - [`types`]: Request parameters, image descriptors and configuration
//! - [`error`]: Error handling for the helpers around dispatch
//!
//! ## Wire Protocol
//!
//! | inbound command | effect |
//! |---|---|
//! | `fuzzyList` | replaces the fuzzy matcher's candidate list |
//! | `retrieveUrls` | creates (or replaces) the instance for `id` and starts it |
//! | `stopDownloads` | asks every registered instance to stop |
//! | `toggleFiltering` | sets the shared filter flag |
//!
//! Outbound events are `fuzzyEvent`, `timeout`, `error`, `image` and
//! `completed`. Anything else arriving inbound is ignored.

pub mod error;
pub mod fuzzy;
pub mod manager;
pub mod message;
pub mod provider;
pub mod rate_limit;
pub mod types;

/// Prelude module for convenient imports.
///
/// ```rust
/// use provider_worker::prelude::*;
///
/// // Now you have access to:
/// // - ProviderManager, ProviderInstance
/// // - Provider, ProviderProxy
/// // - InboundMessage, OutboundMessage
/// // - FuzzyMatcher, TitleMatcher
/// // - ImageContent, RetrieveRequest, ErrorCode, ManagerConfig
/// ```
pub mod prelude {
    pub use crate::{
        fuzzy::{FuzzyCallback, FuzzyEvent, FuzzyMatcher, TitleMatcher},
        manager::{ProviderInstance, ProviderManager},
        message::{InboundMessage, OutboundMessage},
        provider::{Provider, ProviderProxy},
        types::{
            ErrorCode, ImageContent, ImageProviderApis, ManagerConfig, ManagerConfigBuilder,
            RetrieveRequest,
        },
    };
}

// Re-export main types at crate root for direct access
pub use error::{Error, Result};
pub use fuzzy::{FuzzyEvent, FuzzyMatcher, TitleMatcher};
pub use manager::{ProviderInstance, ProviderManager};
pub use message::{InboundMessage, OutboundMessage};
pub use provider::{Provider, ProviderProxy};
pub use rate_limit::RateLimiter;
pub use types::{ErrorCode, ImageContent, ImageProviderApis, ManagerConfig, RetrieveRequest};
