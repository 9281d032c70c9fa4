//! Vertex AI service-account authentication strategy.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use super::StrategyKind;
use super::traits::{AuthStrategy, normalize_model};
use crate::credentials::Credential;
use crate::jwt::{JwtManager, TokenOptions};
use crate::{Error, Result};

/// Audience claim for self-signed Vertex AI tokens.
const VERTEX_JWT_AUDIENCE: &str = "https://aiplatform.googleapis.com/";

/// Placeholder emitted when token generation fails during header
/// construction. Syntactically valid, never accepted by the API.
const PLACEHOLDER_TOKEN: &str = "<pending>";

/// Service-account authentication for Vertex AI.
///
/// Accepts four credential shapes: a bare access token, a pre-signed JWT, a
/// key file on disk, or inline key material. Key-material shapes mint a
/// fresh self-signed JWT on every call - there is no token cache.
#[derive(Clone, Debug, Default)]
pub struct ServiceAccountStrategy {
    jwt: JwtManager,
}

impl ServiceAccountStrategy {
    pub fn new() -> Self {
        Self {
            jwt: JwtManager::new(),
        }
    }

    /// Use a preconfigured [`JwtManager`] (custom IAM endpoint, lifetime).
    pub fn with_jwt_manager(jwt: JwtManager) -> Self {
        Self { jwt }
    }

    /// Structural well-formedness check for a compact JWT.
    fn validate_jwt_structure(token: &str) -> Result<()> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
            return Err(Error::CredentialFormat(
                "invalid JWT structure: expected three dot-separated segments".into(),
            ));
        }
        if URL_SAFE_NO_PAD.decode(segments[0]).is_err() {
            return Err(Error::CredentialFormat(
                "invalid JWT structure: header is not base64url".into(),
            ));
        }
        Ok(())
    }

    /// Produce a usable bearer token from whichever shape the credential has.
    async fn generate_token(&self, credential: &Credential) -> Result<String> {
        match credential {
            Credential::AccessToken { token, .. } | Credential::PreSignedJwt { token, .. } => {
                Ok(token.clone())
            }
            Credential::ServiceAccountFile { path, .. } => {
                let key = self.jwt.load_service_account_key(path).await?;
                key.validate()?;
                let claims = self.jwt.create_claims(&key.client_email, VERTEX_JWT_AUDIENCE);
                claims.validate()?;
                self.jwt.sign_with_key(&claims, &key)
            }
            Credential::ServiceAccountData { key, .. } => {
                key.validate()?;
                let claims = self.jwt.create_claims(&key.client_email, VERTEX_JWT_AUDIENCE);
                claims.validate()?;
                self.jwt.sign_with_key(&claims, key)
            }
            Credential::ApiKey { .. } => Err(Error::CredentialFormat(
                "service account strategy cannot use an api_key credential".into(),
            )),
        }
    }
}

#[async_trait]
impl AuthStrategy for ServiceAccountStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ServiceAccount
    }

    fn name(&self) -> &'static str {
        "vertex"
    }

    async fn authenticate(&self, credential: &Credential) -> Result<()> {
        match credential {
            Credential::AccessToken { token, .. } => {
                if token.is_empty() {
                    return Err(Error::CredentialFormat("empty access token".into()));
                }
                Ok(())
            }
            Credential::PreSignedJwt { token, .. } => Self::validate_jwt_structure(token),
            Credential::ServiceAccountFile { path, .. } => {
                let key = self.jwt.load_service_account_key(path).await?;
                key.validate()
            }
            Credential::ServiceAccountData { key, .. } => key.validate(),
            Credential::ApiKey { .. } => Err(Error::CredentialFormat(
                "service account strategy cannot use an api_key credential".into(),
            )),
        }
    }

    async fn headers(&self, credential: &Credential) -> Vec<(String, String)> {
        let token = match self.generate_token(credential).await {
            Ok(token) => token,
            Err(e) => {
                // Degrade instead of failing: the error was already
                // reportable at authenticate/token-generation time.
                tracing::warn!(
                    error = %e,
                    credential_type = credential.credential_type(),
                    "vertex token generation failed, emitting placeholder header"
                );
                PLACEHOLDER_TOKEN.to_string()
            }
        };

        let mut headers = vec![("Authorization".to_string(), format!("Bearer {}", token))];
        if let Some(project_id) = credential.project_id() {
            headers.push(("x-goog-user-project".to_string(), project_id.to_string()));
        }
        headers
    }

    fn base_url(&self, credential: &Credential) -> Result<String> {
        let location = credential
            .location()
            .ok_or_else(|| Error::Config("Missing Vertex AI location".into()))?;
        credential
            .project_id()
            .ok_or_else(|| Error::Config("Missing Vertex AI project_id".into()))?;

        Ok(format!("https://{}-aiplatform.googleapis.com/v1", location))
    }

    fn build_path(&self, model: &str, endpoint: &str, credential: &Credential) -> String {
        let model = normalize_model(model);
        match (credential.project_id(), credential.location()) {
            (Some(project_id), Some(location)) => format!(
                "projects/{}/locations/{}/publishers/google/models/{}:{}",
                project_id, location, model, endpoint
            ),
            // Without routing information, fall back to a bare model path.
            _ => format!("models/{}:{}", model, endpoint),
        }
    }

    async fn refresh(&self, credential: &Credential) -> Result<Credential> {
        let (email, opts) = match credential {
            // Nothing to regenerate from; tokens provided by the caller are
            // the caller's to refresh.
            Credential::AccessToken { .. } | Credential::PreSignedJwt { .. } => {
                return Ok(credential.clone());
            }
            Credential::ServiceAccountFile { path, .. } => {
                let key = self.jwt.load_service_account_key(path).await?;
                key.validate()?;
                let email = key.client_email.clone();
                (email, TokenOptions::default().with_key_data(key))
            }
            Credential::ServiceAccountData { key, .. } => {
                key.validate()?;
                (
                    key.client_email.clone(),
                    TokenOptions::default().with_key_data(key.clone()),
                )
            }
            Credential::ApiKey { .. } => {
                return Err(Error::CredentialFormat(
                    "service account strategy cannot use an api_key credential".into(),
                ));
            }
        };

        let token = self
            .jwt
            .create_signed_token(&email, VERTEX_JWT_AUDIENCE, &opts)
            .await?;

        let mut refreshed = Credential::access_token(token);
        if let Some(project_id) = credential.project_id() {
            refreshed = refreshed.with_project_id(project_id);
        }
        if let Some(location) = credential.location() {
            refreshed = refreshed.with_location(location);
        }
        Ok(refreshed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::ServiceAccountKey;

    fn vertex_cred() -> Credential {
        Credential::access_token("ya29.token")
            .with_project_id("my-project")
            .with_location("us-central1")
    }

    fn inline_key(private_key: &str) -> ServiceAccountKey {
        ServiceAccountKey::from_json(serde_json::json!({
            "type": "service_account",
            "project_id": "my-project",
            "private_key": private_key,
            "client_email": "sa@my-project.iam.gserviceaccount.com",
        }))
        .unwrap()
    }

    /// A structurally valid (unsigned-garbage) compact JWT for shape checks.
    fn well_formed_jwt() -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(r#"{"iss":"sa@x"}"#);
        format!("{}.{}.signature", header, payload)
    }

    #[tokio::test]
    async fn test_authenticate_access_token() {
        let strategy = ServiceAccountStrategy::new();
        assert!(strategy.authenticate(&vertex_cred()).await.is_ok());
        assert!(
            strategy
                .authenticate(&Credential::access_token(""))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_authenticate_pre_signed_jwt() {
        let strategy = ServiceAccountStrategy::new();
        assert!(
            strategy
                .authenticate(&Credential::pre_signed_jwt(well_formed_jwt()))
                .await
                .is_ok()
        );
        let err = strategy
            .authenticate(&Credential::pre_signed_jwt("no-separators-here"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid JWT structure"));
    }

    #[tokio::test]
    async fn test_authenticate_inline_data_names_missing_field() {
        let strategy = ServiceAccountStrategy::new();
        let key = ServiceAccountKey::from_json(serde_json::json!({
            "project_id": "my-project",
            "private_key": "pem",
        }))
        .unwrap();
        let err = strategy
            .authenticate(&Credential::service_account_data(key))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("client_email"));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_api_key() {
        let strategy = ServiceAccountStrategy::new();
        let err = strategy
            .authenticate(&Credential::api_key("sk-live"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CredentialFormat(_)));
    }

    #[tokio::test]
    async fn test_headers_from_access_token() {
        let strategy = ServiceAccountStrategy::new();
        let headers = strategy.headers(&vertex_cred()).await;
        assert!(
            headers
                .iter()
                .any(|(k, v)| k == "Authorization" && v == "Bearer ya29.token")
        );
        assert!(
            headers
                .iter()
                .any(|(k, v)| k == "x-goog-user-project" && v == "my-project")
        );
    }

    #[tokio::test]
    async fn test_headers_degrade_to_placeholder() {
        let strategy = ServiceAccountStrategy::new();
        let cred = Credential::service_account_data(inline_key("not-a-pem"))
            .with_project_id("my-project")
            .with_location("us-central1");

        let headers = strategy.headers(&cred).await;
        assert!(
            headers
                .iter()
                .any(|(k, v)| k == "Authorization" && v == "Bearer <pending>")
        );
    }

    #[test]
    fn test_base_url_requires_routing() {
        let strategy = ServiceAccountStrategy::new();
        assert_eq!(
            strategy.base_url(&vertex_cred()).unwrap(),
            "https://us-central1-aiplatform.googleapis.com/v1"
        );

        let err = strategy
            .base_url(&Credential::access_token("ya29.t").with_project_id("p"))
            .unwrap_err();
        assert!(err.to_string().contains("Missing Vertex AI location"));

        let err = strategy
            .base_url(&Credential::access_token("ya29.t").with_location("us-central1"))
            .unwrap_err();
        assert!(err.to_string().contains("Missing Vertex AI project_id"));
    }

    #[test]
    fn test_build_path_is_deterministic() {
        let strategy = ServiceAccountStrategy::new();
        let cred = vertex_cred();
        let a = strategy.build_path("gemini-2.0-flash", "generateContent", &cred);
        let b = strategy.build_path("gemini-2.0-flash", "generateContent", &cred);
        assert_eq!(a, b);
        assert_eq!(
            a,
            "projects/my-project/locations/us-central1/publishers/google/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_build_path_normalizes_model_prefix() {
        let strategy = ServiceAccountStrategy::new();
        let path = strategy.build_path("models/gemini-2.0-flash", "generateContent", &vertex_cred());
        assert_eq!(
            path,
            "projects/my-project/locations/us-central1/publishers/google/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_build_path_falls_back_without_routing() {
        let strategy = ServiceAccountStrategy::new();
        let path = strategy.build_path(
            "gemini-2.0-flash",
            "generateContent",
            &Credential::access_token("ya29.t"),
        );
        assert_eq!(path, "models/gemini-2.0-flash:generateContent");
    }

    #[tokio::test]
    async fn test_refresh_is_noop_for_tokens() {
        let strategy = ServiceAccountStrategy::new();
        let refreshed = strategy.refresh(&vertex_cred()).await.unwrap();
        assert_eq!(refreshed.credential_type(), "access_token");

        let jwt = Credential::pre_signed_jwt(well_formed_jwt());
        let refreshed = strategy.refresh(&jwt).await.unwrap();
        assert_eq!(refreshed.credential_type(), "pre_signed_jwt");
    }

    #[tokio::test]
    async fn test_refresh_surfaces_bad_key_material() {
        let strategy = ServiceAccountStrategy::new();
        let cred = Credential::service_account_data(inline_key("not-a-pem"));
        let err = strategy.refresh(&cred).await.unwrap_err();
        assert!(matches!(err, Error::Signing(_)));
    }
}
