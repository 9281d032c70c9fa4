//! Static application configuration and environment helpers.

use std::path::PathBuf;

use crate::credentials::ServiceAccountKey;

/// Get an optional environment variable.
pub(crate) fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with fallback keys.
pub(crate) fn env_with_fallbacks(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| env_opt(key))
}

/// Application-level authentication defaults.
///
/// This is the lowest-precedence tier: per-request [`AuthOptions`] win, then
/// environment variables, then these values. The struct is read-only once
/// built; the resolver reads the environment fresh on every call rather than
/// snapshotting it here.
///
/// [`AuthOptions`]: crate::resolver::AuthOptions
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// Gemini API key.
    pub api_key: Option<String>,
    /// Vertex AI project id.
    pub project_id: Option<String>,
    /// Vertex AI location (e.g. `us-central1`).
    pub location: Option<String>,
    /// Fallback access token, consulted after key material.
    pub access_token: Option<String>,
    /// Path to a service-account key file.
    pub service_account_key_path: Option<PathBuf>,
    /// Inline service-account key material.
    pub service_account_data: Option<ServiceAccountKey>,
}

impl AuthConfig {
    /// Builder method to set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Builder method to set the project id.
    pub fn with_project_id(mut self, id: impl Into<String>) -> Self {
        self.project_id = Some(id.into());
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder method to set the fallback access token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Builder method to set the key file path.
    pub fn with_service_account_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.service_account_key_path = Some(path.into());
        self
    }

    /// Builder method to set inline key material.
    pub fn with_service_account_data(mut self, key: ServiceAccountKey) -> Self {
        self.service_account_data = Some(key);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chains() {
        let config = AuthConfig::default()
            .with_api_key("sk-test")
            .with_project_id("proj")
            .with_location("europe-west4");

        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.project_id.as_deref(), Some("proj"));
        assert_eq!(config.location.as_deref(), Some("europe-west4"));
        assert!(config.access_token.is_none());
    }

    #[test]
    fn test_env_opt_filters_empty() {
        // SAFETY: Test-only environment setup, no concurrent reader of this var
        unsafe { std::env::set_var("GEMINI_AUTH_TEST_EMPTY_VAR", "") };
        assert_eq!(env_opt("GEMINI_AUTH_TEST_EMPTY_VAR"), None);
        unsafe { std::env::remove_var("GEMINI_AUTH_TEST_EMPTY_VAR") };
    }

    #[test]
    fn test_env_with_fallbacks_order() {
        // SAFETY: Test-only environment setup, vars unique to this test
        unsafe {
            std::env::set_var("GEMINI_AUTH_TEST_FB_SECOND", "second");
        }
        assert_eq!(
            env_with_fallbacks(&["GEMINI_AUTH_TEST_FB_FIRST", "GEMINI_AUTH_TEST_FB_SECOND"]),
            Some("second".to_string())
        );
        unsafe { std::env::remove_var("GEMINI_AUTH_TEST_FB_SECOND") };
    }
}
