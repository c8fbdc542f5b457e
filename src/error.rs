//! Error types and result handling for the provider worker.
//!
//! Dispatching inbound commands never fails: malformed or unknown commands are
//! dropped and provider failures travel outward as `error` events. The types in
//! this module cover the helpers around that boundary, such as decoding inbound
//! text, encoding outbound messages, reading per-provider API settings and
//! building a [`ManagerConfig`](crate::types::ManagerConfig).
//!
//! # Examples
//!
//! ```rust
//! use provider_worker::{Error, InboundMessage};
//!
//! match InboundMessage::parse("not json") {
//!     Ok(Some(message)) => println!("decoded {:?}", message),
//!     Ok(None) => println!("not a known command"),
//!     Err(Error::Json(e)) => println!("bad payload: {}", e),
//!     Err(e) => println!("other error: {}", e),
//! }
//! ```

use thiserror::Error;

/// Type alias for Results with provider worker errors.
///
/// ```rust
/// use provider_worker::{Error, Result};
///
/// fn example_with_error() -> Result<()> {
///     Err(Error::config("provider name is required"))
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the fallible helpers of this crate.
///
/// # Variants
///
/// * [`Json`](Error::Json) - JSON encoding and decoding errors
/// * [`Config`](Error::Config) - Invalid manager configuration
/// * [`ChannelClosed`](Error::ChannelClosed) - The outbound receiver was dropped
#[derive(Error, Debug)]
pub enum Error {
    /// JSON serialization and deserialization errors.
    ///
    /// Produced when inbound text is not valid JSON, when an outbound message
    /// cannot be rendered, or when provider API settings do not match the
    /// requested type.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Manager configuration errors.
    ///
    /// ```rust
    /// use provider_worker::Error;
    ///
    /// let error = Error::config("provider name is required");
    /// assert_eq!(error.to_string(), "Config error: provider name is required");
    /// ```
    #[error("Config error: {0}")]
    Config(String),

    /// The outbound channel has no receiver anymore.
    #[error("Outbound channel closed")]
    ChannelClosed,
}

impl Error {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}

impl From<derive_builder::UninitializedFieldError> for Error {
    fn from(e: derive_builder::UninitializedFieldError) -> Self {
        Error::Config(e.to_string())
    }
}
