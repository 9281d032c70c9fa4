//! # gemini-auth
//!
//! Multi-strategy authentication for the Google Gemini generative-AI API.
//!
//! The same logical provider exposes two authentication surfaces:
//!
//! - **API key** (`generativelanguage.googleapis.com`): a single key sent as
//!   a bearer credential header.
//! - **Service account** (Vertex AI, `{location}-aiplatform.googleapis.com`):
//!   OAuth2-style bearer tokens minted from service-account key material,
//!   either by signing a JWT locally (RS256) or by delegating the signature
//!   to the IAM credentials API.
//!
//! This crate resolves credentials from layered sources (per-call overrides,
//! process environment, static application config), dispatches to the right
//! strategy, and hands back ready-to-use headers plus routing information.
//! Sending the request is the caller's job.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gemini_auth::{AuthConfig, AuthCoordinator, AuthOptions, StrategyKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), gemini_auth::Error> {
//!     let coordinator = AuthCoordinator::new(AuthConfig::default());
//!
//!     let auth = coordinator
//!         .coordinate(StrategyKind::ApiKey, &AuthOptions::default())
//!         .await?;
//!
//!     for (name, value) in &auth.headers {
//!         println!("{}: {}", name, value);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Design notes
//!
//! There is no token cache: every coordination call re-resolves credentials
//! and, on the IAM-signing path, issues a fresh remote signing call.
//! Concurrent callers will duplicate signing traffic under load; wrap the
//! coordinator in your own short-lived cache if that matters. No retries or
//! timeouts are performed here either - the transport owns those.

#![deny(rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod coordinator;
pub mod credentials;
pub mod jwt;
pub mod resolver;
pub mod strategy;

pub use config::AuthConfig;
pub use coordinator::{AuthCoordinator, CoordinatedAuth};
pub use credentials::{Credential, ServiceAccountKey};
pub use jwt::{JwtClaims, JwtManager, JwtSigner, RsaKeySigner, TokenOptions};
pub use resolver::{AuthOptions, CredentialResolver};
pub use strategy::{ApiKeyStrategy, AuthStrategy, ServiceAccountStrategy, StrategyKind};

/// Error type for authentication operations.
///
/// Each variant maps to one failure class so callers can decide whether to
/// fix configuration, repair credential material, or retry at the transport
/// layer. No variant is produced by an internal retry - every failure
/// surfaces on the first attempt.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid or missing configuration (project id, location, API key,
    /// authentication method).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed credential material (bad JSON, missing service-account
    /// fields, structurally invalid JWT).
    #[error("Invalid credential: {0}")]
    CredentialFormat(String),

    /// Local signing failed (unusable private key, claim validation).
    #[error("Signing failed: {0}")]
    Signing(String),

    /// The IAM credentials API rejected a remote signing request.
    #[error("IAM signing failed (HTTP {status}): {body}")]
    IamSigning { status: u16, body: String },

    /// Network failure reaching the signing endpoint.
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// File system operation failed (service-account key file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Strategy selector did not name a known strategy.
    #[error("Unknown authentication strategy: {0}")]
    UnknownStrategy(String),

    /// Authentication failed, with strategy-scoped context.
    ///
    /// Wraps the underlying failure so its category survives the added
    /// context: a wrapped configuration error still reports as
    /// [`ErrorCategory::Configuration`], a wrapped transport error stays
    /// retryable.
    #[error("{message}")]
    Auth {
        message: String,
        #[source]
        source: Box<Error>,
    },
}

/// Error category for unified error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or inconsistent configuration
    Configuration,
    /// Credential material is present but malformed
    Credential,
    /// Local or remote signing failure
    Signing,
    /// Network errors that may succeed on retry
    Transient,
    /// Internal errors (IO, JSON, unexpected states)
    Internal,
}

impl Error {
    /// Wrap a failure with strategy-scoped context, preserving its category.
    pub fn auth(message: impl Into<String>, source: Error) -> Self {
        Error::Auth {
            message: message.into(),
            source: Box::new(source),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::UnknownStrategy(_) => ErrorCategory::Configuration,
            Error::CredentialFormat(_) => ErrorCategory::Credential,
            Error::Signing(_) | Error::IamSigning { .. } => ErrorCategory::Signing,
            Error::Network(_) => ErrorCategory::Transient,
            Error::Json(_) | Error::Io(_) => ErrorCategory::Internal,
            Error::Auth { source, .. } => source.category(),
        }
    }

    pub fn is_configuration_error(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    /// Whether a retry at the transport layer could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Transient
    }
}

/// Result type alias using [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
