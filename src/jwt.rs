//! JWT claim construction and signing.
//!
//! Two signing backends produce tokens for the Vertex AI surface: local
//! RS256 signing over the service-account private key, and the IAM
//! credentials API which signs on our behalf given a valid access token.
//! Local signing sits behind the narrow [`JwtSigner`] seam so tests can
//! substitute a deterministic fake instead of doing real cryptography.

use std::path::{Path, PathBuf};

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::credentials::ServiceAccountKey;
use crate::{Error, Result};

/// Default lifetime of a freshly minted token.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

const DEFAULT_IAM_ENDPOINT: &str = "https://iamcredentials.googleapis.com";

/// Time-bounded JWT claim set.
///
/// Constructed fresh for every signing call; never persisted or reused.
///
/// The subject intentionally tracks the *audience*, not the issuer. This is
/// unusual (the common convention is `sub == iss` for self-signed
/// service-account tokens) but is the documented behavior of this system;
/// do not "fix" it without confirming with stakeholders.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl JwtClaims {
    /// Build a claim set issued now with the given lifetime.
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>, lifetime_secs: i64) -> Self {
        Self::at_time(issuer, audience, lifetime_secs, Utc::now().timestamp())
    }

    /// Build a claim set with an explicit issued-at instant.
    pub fn at_time(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        lifetime_secs: i64,
        issued_at: i64,
    ) -> Self {
        let aud = audience.into();
        Self {
            iss: issuer.into(),
            sub: aud.clone(),
            aud,
            iat: issued_at,
            exp: issued_at + lifetime_secs,
        }
    }

    /// Check structural validity: all string fields non-empty, `exp > iat`.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("iss", &self.iss), ("aud", &self.aud), ("sub", &self.sub)] {
            if value.is_empty() {
                return Err(Error::Signing(format!("JWT claim '{}' is empty", name)));
            }
        }
        if self.exp <= self.iat {
            return Err(Error::Signing(format!(
                "JWT expiry {} is not after issued-at {}",
                self.exp, self.iat
            )));
        }
        Ok(())
    }
}

/// Capability to sign a claim set into a compact JWT.
pub trait JwtSigner: Send + Sync {
    fn sign(&self, claims: &JwtClaims) -> Result<String>;
}

/// RS256 signer over a PEM-encoded service-account private key.
pub struct RsaKeySigner {
    key: EncodingKey,
    key_id: Option<String>,
}

impl RsaKeySigner {
    /// Build a signer from service-account key material.
    pub fn from_service_account(key: &ServiceAccountKey) -> Result<Self> {
        key.validate()?;
        let encoding =
            EncodingKey::from_rsa_pem(key.private_key.expose_secret().as_bytes())
                .map_err(|e| Error::Signing(format!("invalid key format: {}", e)))?;
        Ok(Self {
            key: encoding,
            key_id: (!key.private_key_id.is_empty()).then(|| key.private_key_id.clone()),
        })
    }
}

impl JwtSigner for RsaKeySigner {
    fn sign(&self, claims: &JwtClaims) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key_id.clone();
        encode(&header, claims, &self.key).map_err(|e| Error::Signing(e.to_string()))
    }
}

/// Response from the IAM `signJwt` endpoint.
#[derive(Debug, Deserialize)]
struct SignJwtResponse {
    #[serde(rename = "signedJwt")]
    signed_jwt: String,
}

/// Options selecting the signing backend for [`JwtManager::create_signed_token`].
///
/// Checked in a fixed order: key file path, then inline key material, then
/// access token (IAM API). Note this differs from the resolver's
/// access-token-first precedence; the asymmetry is preserved deliberately.
#[derive(Clone, Debug, Default)]
pub struct TokenOptions {
    pub service_account_key_path: Option<PathBuf>,
    pub service_account_data: Option<ServiceAccountKey>,
    pub access_token: Option<String>,
}

impl TokenOptions {
    pub fn with_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.service_account_key_path = Some(path.into());
        self
    }

    pub fn with_key_data(mut self, key: ServiceAccountKey) -> Self {
        self.service_account_data = Some(key);
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

/// Builds claim payloads and produces signed tokens.
///
/// Stateless apart from the HTTP client and endpoint configuration; no
/// token is ever cached here.
#[derive(Clone, Debug)]
pub struct JwtManager {
    http: reqwest::Client,
    iam_endpoint: String,
    token_lifetime_secs: i64,
}

impl Default for JwtManager {
    fn default() -> Self {
        Self::new()
    }
}

impl JwtManager {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            iam_endpoint: DEFAULT_IAM_ENDPOINT.to_string(),
            token_lifetime_secs: DEFAULT_TOKEN_LIFETIME_SECS,
        }
    }

    /// Override the IAM credentials endpoint (mock servers, private access).
    pub fn with_iam_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.iam_endpoint = endpoint.into();
        self
    }

    /// Override the lifetime used for freshly minted claims.
    pub fn with_token_lifetime(mut self, secs: i64) -> Self {
        self.token_lifetime_secs = secs;
        self
    }

    /// Build a claim set for the configured lifetime, issued now.
    pub fn create_claims(&self, issuer: &str, audience: &str) -> JwtClaims {
        JwtClaims::new(issuer, audience, self.token_lifetime_secs)
    }

    /// Sign claims locally with service-account key material.
    pub fn sign_with_key(&self, claims: &JwtClaims, key: &ServiceAccountKey) -> Result<String> {
        RsaKeySigner::from_service_account(key)?.sign(claims)
    }

    /// Sign claims remotely via the IAM credentials API.
    ///
    /// Issues `POST {endpoint}/v1/projects/-/serviceAccounts/{email}:signJwt`
    /// with the JSON-encoded claims as the `payload` string field. A non-200
    /// response or a body without `signedJwt` surfaces as
    /// [`Error::IamSigning`] carrying the status and body.
    pub async fn sign_with_iam(
        &self,
        claims: &JwtClaims,
        service_account_email: &str,
        access_token: &str,
    ) -> Result<String> {
        let url = format!(
            "{}/v1/projects/-/serviceAccounts/{}:signJwt",
            self.iam_endpoint, service_account_email
        );
        let payload = serde_json::to_string(claims)?;

        tracing::debug!(email = service_account_email, "requesting IAM-signed JWT");

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "payload": payload }))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        if !(200..300).contains(&status) {
            return Err(Error::IamSigning { status, body });
        }

        let parsed: SignJwtResponse =
            serde_json::from_str(&body).map_err(|_| Error::IamSigning { status, body })?;
        Ok(parsed.signed_jwt)
    }

    /// Read and parse a service-account key file.
    ///
    /// File-read failures surface as [`Error::Io`]; parse failures as
    /// [`Error::CredentialFormat`].
    pub async fn load_service_account_key(&self, path: &Path) -> Result<ServiceAccountKey> {
        let contents = tokio::fs::read_to_string(path).await?;
        serde_json::from_str(&contents).map_err(|e| {
            Error::CredentialFormat(format!(
                "Invalid service account key file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Build, validate, and sign a token using whichever backend the options
    /// select: key file, inline key material, or the IAM API, in that order.
    pub async fn create_signed_token(
        &self,
        service_account_email: &str,
        audience: &str,
        opts: &TokenOptions,
    ) -> Result<String> {
        let claims = self.create_claims(service_account_email, audience);
        claims.validate()?;

        if let Some(ref path) = opts.service_account_key_path {
            let key = self.load_service_account_key(path).await?;
            return self.sign_with_key(&claims, &key);
        }

        if let Some(ref key) = opts.service_account_data {
            return self.sign_with_key(&claims, key);
        }

        if let Some(ref token) = opts.access_token {
            return self
                .sign_with_iam(&claims, service_account_email, token)
                .await;
        }

        Err(Error::Config(
            "Either service_account_key, service_account_data, or access_token must be provided"
                .into(),
        ))
    }
}
