//! Error types for market data operations.
//!
//! This module defines [`MarketError`] which covers every failure a fetch cycle
//! can run into: session bootstrap, transport, envelope decoding and page
//! scraping. Per-field decode problems are not errors; extractors leave the
//! field absent instead.

use thiserror::Error;

/// Errors that can occur while fetching or decoding market data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    /// Network-related errors (connection failures, non-success status, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// The session cookie or crumb could not be obtained.
    #[error("Session bootstrap failed for {provider}: {reason}")]
    Session {
        /// The provider whose session could not be established.
        provider: String,
        /// What went wrong.
        reason: String,
    },

    /// The top-level response envelope is absent or malformed.
    #[error("Malformed response envelope: {0}")]
    Envelope(String),

    /// A scraped page no longer matches the provider's composite pattern.
    #[error("Page layout of {provider} did not match the expected pattern")]
    PatternMismatch {
        /// The provider whose page failed to match.
        provider: String,
    },

    /// The provider rejected the request's credentials (HTTP 401/403).
    #[error("Authentication failed for provider {0}")]
    AuthenticationFailed(String),

    /// The requested provider is not configured.
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl MarketError {
    /// Builds a [`MarketError::Session`] for the given provider.
    pub fn session(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Session {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if the error indicates the session credentials were rejected.
    #[must_use]
    pub const fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::Session { .. } | Self::AuthenticationFailed(_))
    }
}

/// Result type alias using [`MarketError`].
pub type Result<T> = std::result::Result<T, MarketError>;
