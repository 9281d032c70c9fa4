//! Authentication strategy trait.

use std::fmt::Debug;

use async_trait::async_trait;

use super::StrategyKind;
use crate::Result;
use crate::credentials::Credential;

/// Authentication strategy interface.
///
/// Encapsulates everything scheme-specific: credential validation, header
/// construction, routing, and refresh. Calling code never needs to know
/// which scheme is active - it resolves a [`Credential`] and delegates.
#[async_trait]
pub trait AuthStrategy: Send + Sync + Debug {
    /// The discriminator this strategy handles.
    fn kind(&self) -> StrategyKind;

    /// Strategy name for logging/debugging.
    fn name(&self) -> &'static str;

    /// Validate that the credential is usable by this strategy.
    ///
    /// This is where malformed credential material surfaces; later stages
    /// assume it already ran.
    async fn authenticate(&self, credential: &Credential) -> Result<()>;

    /// Produce outbound headers.
    ///
    /// Infallible by design: if token generation fails here, a syntactically
    /// valid placeholder header is emitted instead, so that request
    /// construction never fails on header formatting alone. The underlying
    /// failure will already have been reported by [`authenticate`] or token
    /// generation.
    ///
    /// [`authenticate`]: AuthStrategy::authenticate
    async fn headers(&self, credential: &Credential) -> Vec<(String, String)>;

    /// Base URL for the scheme's API surface.
    fn base_url(&self, credential: &Credential) -> Result<String>;

    /// Build the resource path for a model/endpoint pair.
    fn build_path(&self, model: &str, endpoint: &str, credential: &Credential) -> String;

    /// Refresh the credential, returning an updated bundle.
    ///
    /// A no-op (clone) for credentials that do not expire or that this
    /// subsystem cannot regenerate.
    async fn refresh(&self, credential: &Credential) -> Result<Credential>;
}

/// Strip a `models/` prefix so path construction never doubles it.
pub(crate) fn normalize_model(model: &str) -> &str {
    model.strip_prefix("models/").unwrap_or(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_model() {
        assert_eq!(normalize_model("gemini-2.0-flash"), "gemini-2.0-flash");
        assert_eq!(normalize_model("models/gemini-2.0-flash"), "gemini-2.0-flash");
    }
}
