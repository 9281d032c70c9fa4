//! Gemini API key authentication strategy.

use async_trait::async_trait;
use secrecy::ExposeSecret;

use super::StrategyKind;
use super::traits::{AuthStrategy, normalize_model};
use crate::credentials::Credential;
use crate::{Error, Result};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// API key authentication for the Gemini developer API.
#[derive(Clone, Debug, Default)]
pub struct ApiKeyStrategy;

impl ApiKeyStrategy {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuthStrategy for ApiKeyStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ApiKey
    }

    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn authenticate(&self, credential: &Credential) -> Result<()> {
        match credential {
            Credential::ApiKey { key } if !key.expose_secret().is_empty() => Ok(()),
            Credential::ApiKey { .. } => Err(Error::Config("missing or invalid API key".into())),
            other => Err(Error::CredentialFormat(format!(
                "API key strategy cannot use a {} credential",
                other.credential_type()
            ))),
        }
    }

    async fn headers(&self, credential: &Credential) -> Vec<(String, String)> {
        match credential {
            Credential::ApiKey { key } => vec![(
                "Authorization".to_string(),
                format!("Bearer {}", key.expose_secret()),
            )],
            other => {
                tracing::warn!(
                    credential_type = other.credential_type(),
                    "gemini headers requested for non-API-key credential, emitting placeholder"
                );
                vec![("Authorization".to_string(), "Bearer <pending>".to_string())]
            }
        }
    }

    fn base_url(&self, _credential: &Credential) -> Result<String> {
        Ok(GEMINI_BASE_URL.to_string())
    }

    fn build_path(&self, model: &str, endpoint: &str, _credential: &Credential) -> String {
        format!("models/{}:{}", normalize_model(model), endpoint)
    }

    /// API keys do not expire in this design.
    async fn refresh(&self, credential: &Credential) -> Result<Credential> {
        Ok(credential.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_authenticate_accepts_non_empty_key() {
        let strategy = ApiKeyStrategy::new();
        assert!(
            strategy
                .authenticate(&Credential::api_key("sk-live-123"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_authenticate_rejects_empty_key() {
        let strategy = ApiKeyStrategy::new();
        let err = strategy
            .authenticate(&Credential::api_key(""))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing or invalid API key"));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_wrong_shape() {
        let strategy = ApiKeyStrategy::new();
        let err = strategy
            .authenticate(&Credential::access_token("ya29.t"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CredentialFormat(_)));
    }

    #[tokio::test]
    async fn test_headers_embed_key() {
        let strategy = ApiKeyStrategy::new();
        let headers = strategy.headers(&Credential::api_key("sk-live-123")).await;
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].0, "Authorization");
        assert_eq!(headers[0].1, "Bearer sk-live-123");
    }

    #[tokio::test]
    async fn test_base_url() {
        let strategy = ApiKeyStrategy::new();
        let url = strategy.base_url(&Credential::api_key("k")).unwrap();
        assert_eq!(url, "https://generativelanguage.googleapis.com/v1beta");
    }

    #[test]
    fn test_build_path() {
        let strategy = ApiKeyStrategy::new();
        let cred = Credential::api_key("k");
        assert_eq!(
            strategy.build_path("gemini-2.0-flash", "generateContent", &cred),
            "models/gemini-2.0-flash:generateContent"
        );
        assert_eq!(
            strategy.build_path("models/gemini-2.0-flash", "streamGenerateContent", &cred),
            "models/gemini-2.0-flash:streamGenerateContent"
        );
    }

    #[tokio::test]
    async fn test_refresh_is_noop() {
        let strategy = ApiKeyStrategy::new();
        let cred = Credential::api_key("sk-live-123");
        let refreshed = strategy.refresh(&cred).await.unwrap();
        assert_eq!(refreshed.credential_type(), "api_key");
    }
}
