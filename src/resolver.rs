//! Credential resolution with layered precedence.
//!
//! Every resolution checks three tiers in order: per-call overrides, the
//! process environment, and static application config. The environment is
//! read fresh on each call - nothing is snapshotted or cached, so a rotated
//! `VERTEX_ACCESS_TOKEN` is picked up by the very next request.

use std::path::PathBuf;

use crate::config::{AuthConfig, env_opt, env_with_fallbacks};
use crate::credentials::{Credential, ServiceAccountKey};
use crate::strategy::StrategyKind;
use crate::{Error, Result};

const API_KEY_VAR: &str = "GEMINI_API_KEY";
const PROJECT_VARS: &[&str] = &["VERTEX_PROJECT_ID", "GOOGLE_CLOUD_PROJECT"];
const LOCATION_VARS: &[&str] = &["VERTEX_LOCATION", "GOOGLE_CLOUD_LOCATION"];
const ACCESS_TOKEN_VAR: &str = "VERTEX_ACCESS_TOKEN";
const KEY_FILE_VARS: &[&str] = &["VERTEX_SERVICE_ACCOUNT", "VERTEX_JSON_FILE"];
/// Ambient ADC key-file path, consulted after the explicit key-file vars.
const ADC_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Default Vertex AI location when none is configured anywhere.
pub const DEFAULT_LOCATION: &str = "us-central1";

/// Per-call authentication overrides.
///
/// The highest-precedence tier. Leave fields unset to fall through to the
/// environment and then to [`AuthConfig`].
#[derive(Clone, Debug, Default)]
pub struct AuthOptions {
    pub api_key: Option<String>,
    pub project_id: Option<String>,
    pub location: Option<String>,
    pub access_token: Option<String>,
    pub service_account_key_path: Option<PathBuf>,
    pub service_account_data: Option<ServiceAccountKey>,
}

impl AuthOptions {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_project_id(mut self, id: impl Into<String>) -> Self {
        self.project_id = Some(id.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_service_account_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.service_account_key_path = Some(path.into());
        self
    }

    pub fn with_service_account_data(mut self, key: ServiceAccountKey) -> Self {
        self.service_account_data = Some(key);
        self
    }
}

/// Resolves a request-scoped credential bundle for a strategy.
#[derive(Clone, Debug, Default)]
pub struct CredentialResolver {
    config: AuthConfig,
}

impl CredentialResolver {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Resolve a credential for the given strategy.
    ///
    /// The returned bundle is owned by this call; it is never cached.
    pub fn resolve(&self, kind: StrategyKind, opts: &AuthOptions) -> Result<Credential> {
        match kind {
            StrategyKind::ApiKey => self.resolve_api_key(opts),
            StrategyKind::ServiceAccount => self.resolve_service_account(opts),
        }
    }

    fn resolve_api_key(&self, opts: &AuthOptions) -> Result<Credential> {
        let key = opts
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| env_opt(API_KEY_VAR))
            .or_else(|| self.config.api_key.clone().filter(|k| !k.is_empty()))
            .ok_or_else(|| Error::Config("missing or invalid API key".into()))?;

        Ok(Credential::api_key(key))
    }

    fn resolve_service_account(&self, opts: &AuthOptions) -> Result<Credential> {
        let project_id = opts
            .project_id
            .clone()
            .filter(|v| !v.is_empty())
            .or_else(|| env_with_fallbacks(PROJECT_VARS))
            .or_else(|| self.config.project_id.clone().filter(|v| !v.is_empty()))
            .ok_or_else(|| Error::Config("Missing Vertex AI project_id".into()))?;

        let location = opts
            .location
            .clone()
            .filter(|v| !v.is_empty())
            .or_else(|| env_with_fallbacks(LOCATION_VARS))
            .or_else(|| self.config.location.clone().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string());

        // Authentication-method precedence, first present value wins.
        // Note: access-token-first here, while token minting checks key
        // material first. The asymmetry is preserved deliberately.
        if let Some(token) = opts.access_token.clone().filter(|t| !t.is_empty()) {
            tracing::debug!("vertex credential resolved from per-call access token");
            return Ok(Credential::access_token(token)
                .with_project_id(project_id)
                .with_location(location));
        }

        let key_path = opts
            .service_account_key_path
            .clone()
            .or_else(|| env_with_fallbacks(KEY_FILE_VARS).map(PathBuf::from))
            .or_else(|| env_opt(ADC_VAR).map(PathBuf::from))
            .or_else(|| self.config.service_account_key_path.clone());
        if let Some(path) = key_path {
            tracing::debug!(path = %path.display(), "vertex credential resolved from key file");
            return Ok(Credential::service_account_file(path)
                .with_project_id(project_id)
                .with_location(location));
        }

        let key_data = opts
            .service_account_data
            .clone()
            .or_else(|| self.config.service_account_data.clone());
        if let Some(key) = key_data {
            tracing::debug!("vertex credential resolved from inline key material");
            return Ok(Credential::service_account_data(key)
                .with_project_id(project_id)
                .with_location(location));
        }

        if let Some(token) = env_opt(ACCESS_TOKEN_VAR)
            .or_else(|| self.config.access_token.clone().filter(|t| !t.is_empty()))
        {
            tracing::debug!("vertex credential resolved from fallback access token");
            return Ok(Credential::access_token(token)
                .with_project_id(project_id)
                .with_location(location));
        }

        Err(Error::Config("Missing Vertex AI authentication method".into()))
    }
}
