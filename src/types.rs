//! Core data types shared by the manager, proxies and wire messages.
//!
//! - [`RetrieveRequest`] - The immutable parameters of one image lookup
//! - [`ImageContent`] - An image found by a provider
//! - [`ImageProviderApis`] - Per-provider API settings bundle
//! - [`ErrorCode`] - Numeric code or message attached to `error` events
//! - [`ManagerConfig`] - Settings for a [`ProviderManager`](crate::ProviderManager)
//!
//! # Examples
//!
//! ```rust
//! use provider_worker::types::*;
//!
//! let request = RetrieveRequest {
//!     id: "42".to_string(),
//!     title: "Hollow Knight".to_string(),
//!     path: "/games/hollow-knight".to_string(),
//!     image_type: "poster".to_string(),
//!     image_provider_apis: ImageProviderApis::default(),
//! };
//!
//! let content = ImageContent::new("https://example.com/cover.jpg");
//! assert_eq!(content.url, "https://example.com/cover.jpg");
//! ```

use derive_builder::Builder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// Parameters of a single `retrieveUrls` request.
///
/// Every field is fixed for the lifetime of the provider instance created for
/// the request; the proxy hands out read-only views of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveRequest {
    /// Request identifier, unique per in-flight request
    pub id: String,

    /// Title the images are looked up for
    pub title: String,

    /// Path of the item on disk
    pub path: String,

    /// Requested image kind, e.g. "poster" or "hero"
    pub image_type: String,

    /// API settings for every image provider
    #[serde(
        rename = "imageProviderAPIs",
        default,
        deserialize_with = "null_as_default"
    )]
    pub image_provider_apis: ImageProviderApis,
}

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An image found by a provider.
///
/// Only `url` is required. Absent optional fields are left out of the
/// encoded form, so `ImageContent::new(url)` encodes as `{"url": ...}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageContent {
    /// Full size image URL
    pub url: String,

    /// Smaller preview URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    /// Name of the provider that found the image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Name of the user who uploaded the image upstream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,

    /// Resolution as reported by the source, e.g. "600x900"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

impl ImageContent {
    /// Creates image content with only a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Per-provider API settings, keyed by provider name.
///
/// The bundle is opaque to the manager; providers pull their own entry out
/// with [`get`](ImageProviderApis::get) or [`settings`](ImageProviderApis::settings).
///
/// ```rust
/// use provider_worker::types::ImageProviderApis;
/// use serde::Deserialize;
/// use serde_json::json;
///
/// #[derive(Deserialize)]
/// struct GridSettings {
///     nsfw: bool,
/// }
///
/// let apis: ImageProviderApis =
///     serde_json::from_value(json!({ "SteamGridDB": { "nsfw": false } })).unwrap();
/// let settings: Option<GridSettings> = apis.settings("SteamGridDB").unwrap();
/// assert!(!settings.unwrap().nsfw);
/// assert!(apis.get("Unknown").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageProviderApis(Map<String, Value>);

impl ImageProviderApis {
    /// Returns the raw settings for `provider`, if present.
    pub fn get(&self, provider: &str) -> Option<&Value> {
        self.0.get(provider)
    }

    /// Deserializes the settings for `provider` into `T`.
    ///
    /// Returns `Ok(None)` when the bundle has no entry for the provider.
    pub fn settings<T: DeserializeOwned>(&self, provider: &str) -> Result<Option<T>> {
        match self.0.get(provider) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// Adds or replaces the settings for `provider`.
    pub fn insert(&mut self, provider: impl Into<String>, settings: Value) {
        self.0.insert(provider.into(), settings);
    }

    /// Returns `true` if no provider has settings in the bundle.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for ImageProviderApis {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Code or message carried by an `error` event.
///
/// Encoded untagged, so it appears on the wire as a plain number or string.
/// The core never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    /// Numeric code, usually an HTTP status
    Code(i64),

    /// Free-form message
    Message(String),
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        ErrorCode::Code(code)
    }
}

impl From<u16> for ErrorCode {
    fn from(code: u16) -> Self {
        ErrorCode::Code(i64::from(code))
    }
}

impl From<&str> for ErrorCode {
    fn from(msg: &str) -> Self {
        ErrorCode::Message(msg.to_string())
    }
}

impl From<String> for ErrorCode {
    fn from(msg: String) -> Self {
        ErrorCode::Message(msg)
    }
}

/// Settings for a [`ProviderManager`](crate::ProviderManager).
///
/// Built with the generated `ManagerConfigBuilder`:
///
/// ```rust
/// use provider_worker::types::ManagerConfigBuilder;
///
/// let config = ManagerConfigBuilder::default()
///     .provider_name("SteamGridDB")
///     .filter_enabled(true)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.provider_name, "SteamGridDB");
/// assert!(config.filter_enabled);
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(error = "crate::error::Error"))]
pub struct ManagerConfig {
    /// Name reported in `timeout` and `error` events
    pub provider_name: String,

    /// Initial value of the shared filter flag
    #[builder(default)]
    pub filter_enabled: bool,
}

impl From<&str> for ManagerConfig {
    fn from(provider_name: &str) -> Self {
        ManagerConfig {
            provider_name: provider_name.to_string(),
            filter_enabled: false,
        }
    }
}

impl From<String> for ManagerConfig {
    fn from(provider_name: String) -> Self {
        ManagerConfig {
            provider_name,
            filter_enabled: false,
        }
    }
}
