//! Authentication strategies for the Gemini and Vertex AI surfaces.

mod api_key;
mod service_account;
mod traits;

pub use api_key::ApiKeyStrategy;
pub use service_account::ServiceAccountStrategy;
pub use traits::AuthStrategy;

use crate::{Error, Result};

/// Discriminator selecting which authentication scheme handles a request.
///
/// Never inferred implicitly; callers either pass it explicitly or go
/// through [`AuthCoordinator::determine_strategy`].
///
/// [`AuthCoordinator::determine_strategy`]: crate::coordinator::AuthCoordinator::determine_strategy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Gemini API key scheme.
    ApiKey,
    /// Vertex AI service-account / OAuth2 scheme.
    ServiceAccount,
}

impl StrategyKind {
    /// Short machine name, matching [`AuthStrategy::name`].
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::ApiKey => "gemini",
            StrategyKind::ServiceAccount => "vertex",
        }
    }

    /// Human-facing provider name used in error context.
    pub fn display_name(&self) -> &'static str {
        match self {
            StrategyKind::ApiKey => "Gemini",
            StrategyKind::ServiceAccount => "Vertex AI",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gemini" | "api_key" => Ok(StrategyKind::ApiKey),
            "vertex" | "vertex_ai" | "service_account" => Ok(StrategyKind::ServiceAccount),
            other => Err(Error::UnknownStrategy(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        assert_eq!("gemini".parse::<StrategyKind>().unwrap(), StrategyKind::ApiKey);
        assert_eq!(
            "service_account".parse::<StrategyKind>().unwrap(),
            StrategyKind::ServiceAccount
        );
        assert_eq!(StrategyKind::ServiceAccount.to_string(), "vertex");
    }

    #[test]
    fn test_unknown_kind() {
        let err = "oauth2".parse::<StrategyKind>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown authentication strategy: oauth2");
    }
}
