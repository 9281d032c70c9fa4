//! Credential types.

use std::fmt;
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::{Error, Result};

fn empty_secret() -> SecretString {
    SecretString::from("")
}

/// Parsed Google service-account key material.
///
/// Matches the JSON key file downloaded from the Cloud console. Every field
/// defaults to empty so that a partial file still deserializes; call
/// [`ServiceAccountKey::validate`] to get an error naming the first missing
/// required field instead of an opaque serde failure.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    pub key_type: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub private_key_id: String,
    #[serde(default = "empty_secret")]
    pub private_key: SecretString,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub auth_uri: String,
    #[serde(default)]
    pub token_uri: String,
    #[serde(default)]
    pub auth_provider_x509_cert_url: String,
    #[serde(default)]
    pub client_x509_cert_url: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Checks the fields required for signing, in a fixed order.
    ///
    /// Returns an error naming the first missing field.
    pub fn validate(&self) -> Result<()> {
        for (name, present) in [
            ("client_email", !self.client_email.is_empty()),
            ("private_key", !self.private_key.expose_secret().is_empty()),
            ("project_id", !self.project_id.is_empty()),
        ] {
            if !present {
                return Err(Error::CredentialFormat(format!(
                    "Missing required service account field: {}",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Parse inline key material from a JSON value.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| Error::CredentialFormat(format!("Invalid service account data: {}", e)))
    }
}

/// A resolved authentication credential.
///
/// Exactly one shape is active per resolved bundle; the shape determines
/// which strategy is eligible. Bundles are request-scoped - they are never
/// cached or shared between coordination calls.
#[derive(Clone)]
pub enum Credential {
    /// Gemini API key.
    ApiKey { key: SecretString },
    /// Bare Google Cloud access token.
    AccessToken {
        token: String,
        project_id: Option<String>,
        location: Option<String>,
    },
    /// Path to a service-account key file on disk.
    ServiceAccountFile {
        path: PathBuf,
        project_id: Option<String>,
        location: Option<String>,
    },
    /// Inline service-account key material.
    ServiceAccountData {
        key: ServiceAccountKey,
        project_id: Option<String>,
        location: Option<String>,
    },
    /// A JWT the caller signed (or had signed) ahead of time.
    PreSignedJwt {
        token: String,
        project_id: Option<String>,
        location: Option<String>,
    },
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::ApiKey { .. } => f.debug_struct("ApiKey").field("key", &"[redacted]").finish(),
            Credential::AccessToken {
                project_id,
                location,
                ..
            } => f
                .debug_struct("AccessToken")
                .field("token", &"[redacted]")
                .field("project_id", project_id)
                .field("location", location)
                .finish(),
            Credential::ServiceAccountFile {
                path,
                project_id,
                location,
            } => f
                .debug_struct("ServiceAccountFile")
                .field("path", path)
                .field("project_id", project_id)
                .field("location", location)
                .finish(),
            Credential::ServiceAccountData {
                key,
                project_id,
                location,
            } => f
                .debug_struct("ServiceAccountData")
                .field("key", key)
                .field("project_id", project_id)
                .field("location", location)
                .finish(),
            Credential::PreSignedJwt {
                project_id,
                location,
                ..
            } => f
                .debug_struct("PreSignedJwt")
                .field("token", &"[redacted]")
                .field("project_id", project_id)
                .field("location", location)
                .finish(),
        }
    }
}

impl Credential {
    /// Create an API key credential.
    pub fn api_key(key: impl Into<String>) -> Self {
        Self::ApiKey {
            key: SecretString::from(key.into()),
        }
    }

    /// Create a bare access-token credential.
    pub fn access_token(token: impl Into<String>) -> Self {
        Self::AccessToken {
            token: token.into(),
            project_id: None,
            location: None,
        }
    }

    /// Create a key-file credential.
    pub fn service_account_file(path: impl Into<PathBuf>) -> Self {
        Self::ServiceAccountFile {
            path: path.into(),
            project_id: None,
            location: None,
        }
    }

    /// Create an inline key-material credential.
    pub fn service_account_data(key: ServiceAccountKey) -> Self {
        Self::ServiceAccountData {
            key,
            project_id: None,
            location: None,
        }
    }

    /// Create a pre-signed JWT credential.
    pub fn pre_signed_jwt(token: impl Into<String>) -> Self {
        Self::PreSignedJwt {
            token: token.into(),
            project_id: None,
            location: None,
        }
    }

    /// Attach a project id (service-account family only; no-op for API keys).
    pub fn with_project_id(mut self, id: impl Into<String>) -> Self {
        if let Some(slot) = self.project_id_mut() {
            *slot = Some(id.into());
        }
        self
    }

    /// Attach a location (service-account family only; no-op for API keys).
    pub fn with_location(mut self, loc: impl Into<String>) -> Self {
        if let Some(slot) = self.location_mut() {
            *slot = Some(loc.into());
        }
        self
    }

    fn project_id_mut(&mut self) -> Option<&mut Option<String>> {
        match self {
            Credential::ApiKey { .. } => None,
            Credential::AccessToken { project_id, .. }
            | Credential::ServiceAccountFile { project_id, .. }
            | Credential::ServiceAccountData { project_id, .. }
            | Credential::PreSignedJwt { project_id, .. } => Some(project_id),
        }
    }

    fn location_mut(&mut self) -> Option<&mut Option<String>> {
        match self {
            Credential::ApiKey { .. } => None,
            Credential::AccessToken { location, .. }
            | Credential::ServiceAccountFile { location, .. }
            | Credential::ServiceAccountData { location, .. }
            | Credential::PreSignedJwt { location, .. } => Some(location),
        }
    }

    /// The resolved project id, if this shape carries one.
    pub fn project_id(&self) -> Option<&str> {
        match self {
            Credential::ApiKey { .. } => None,
            Credential::AccessToken { project_id, .. }
            | Credential::ServiceAccountFile { project_id, .. }
            | Credential::PreSignedJwt { project_id, .. } => project_id.as_deref(),
            // Inline key material knows its own project when the bundle does not.
            Credential::ServiceAccountData { key, project_id, .. } => project_id
                .as_deref()
                .or((!key.project_id.is_empty()).then_some(key.project_id.as_str())),
        }
    }

    /// The resolved location, if this shape carries one.
    pub fn location(&self) -> Option<&str> {
        match self {
            Credential::ApiKey { .. } => None,
            Credential::AccessToken { location, .. }
            | Credential::ServiceAccountFile { location, .. }
            | Credential::ServiceAccountData { location, .. }
            | Credential::PreSignedJwt { location, .. } => location.as_deref(),
        }
    }

    /// Credential shape name for logging.
    pub fn credential_type(&self) -> &'static str {
        match self {
            Credential::ApiKey { .. } => "api_key",
            Credential::AccessToken { .. } => "access_token",
            Credential::ServiceAccountFile { .. } => "service_account_file",
            Credential::ServiceAccountData { .. } => "service_account_data",
            Credential::PreSignedJwt { .. } => "pre_signed_jwt",
        }
    }
}
