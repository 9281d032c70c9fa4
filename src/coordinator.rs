//! Multi-strategy authentication coordination.

use crate::config::AuthConfig;
use crate::credentials::Credential;
use crate::jwt::JwtManager;
use crate::resolver::{AuthOptions, CredentialResolver};
use crate::strategy::{ApiKeyStrategy, AuthStrategy, ServiceAccountStrategy, StrategyKind};
use crate::{Error, Result};

/// Ready-to-use authentication artifacts for one outbound request.
#[derive(Clone, Debug)]
pub struct CoordinatedAuth {
    /// The strategy that produced the headers.
    pub kind: StrategyKind,
    /// Header name/value pairs for the transport to attach.
    pub headers: Vec<(String, String)>,
}

/// Facade over credential resolution and strategy dispatch.
///
/// Stateless: every call resolves credentials from scratch and hands the
/// request-scoped bundle to the matching strategy. Independent callers can
/// share one coordinator freely.
#[derive(Clone, Debug, Default)]
pub struct AuthCoordinator {
    resolver: CredentialResolver,
    api_key: ApiKeyStrategy,
    service_account: ServiceAccountStrategy,
}

impl AuthCoordinator {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            resolver: CredentialResolver::new(config),
            api_key: ApiKeyStrategy::new(),
            service_account: ServiceAccountStrategy::new(),
        }
    }

    /// Use a preconfigured [`JwtManager`] for the service-account strategy
    /// (custom IAM endpoint, token lifetime).
    pub fn with_jwt_manager(mut self, jwt: JwtManager) -> Self {
        self.service_account = ServiceAccountStrategy::with_jwt_manager(jwt);
        self
    }

    fn strategy(&self, kind: StrategyKind) -> &dyn AuthStrategy {
        match kind {
            StrategyKind::ApiKey => &self.api_key,
            StrategyKind::ServiceAccount => &self.service_account,
        }
    }

    /// Resolve credentials, authenticate, and produce outbound headers.
    ///
    /// Any failure is wrapped with a strategy-named prefix
    /// (`"Gemini auth failed: ..."`, `"Vertex AI auth failed: ..."`).
    pub async fn coordinate(
        &self,
        kind: StrategyKind,
        opts: &AuthOptions,
    ) -> Result<CoordinatedAuth> {
        let wrap =
            |e: Error| Error::auth(format!("{} auth failed: {}", kind.display_name(), e), e);

        let credential = self.resolver.resolve(kind, opts).map_err(wrap)?;
        let strategy = self.strategy(kind);
        strategy.authenticate(&credential).await.map_err(wrap)?;
        let headers = strategy.headers(&credential).await;

        tracing::debug!(
            strategy = strategy.name(),
            credential_type = credential.credential_type(),
            "authentication coordinated"
        );

        Ok(CoordinatedAuth { kind, headers })
    }

    /// Infer the strategy from the shape of the provided options.
    ///
    /// A heuristic, not authoritative: an API key implies the Gemini
    /// surface, a project id implies Vertex AI. Prefer passing the kind
    /// explicitly when both are configured.
    pub fn determine_strategy(opts: &AuthOptions) -> Result<StrategyKind> {
        if opts.api_key.is_some() {
            Ok(StrategyKind::ApiKey)
        } else if opts.project_id.is_some() {
            Ok(StrategyKind::ServiceAccount)
        } else {
            Err(Error::Config(
                "Unable to determine authentication strategy from credentials".into(),
            ))
        }
    }

    /// Base URL for the strategy's API surface.
    pub fn base_url(&self, kind: StrategyKind, opts: &AuthOptions) -> Result<String> {
        let credential = self.resolver.resolve(kind, opts)?;
        self.strategy(kind).base_url(&credential)
    }

    /// Resource path for a model/endpoint pair.
    pub fn build_path(
        &self,
        kind: StrategyKind,
        opts: &AuthOptions,
        model: &str,
        endpoint: &str,
    ) -> Result<String> {
        let credential = self.resolver.resolve(kind, opts)?;
        Ok(self.strategy(kind).build_path(model, endpoint, &credential))
    }

    /// Refresh credentials, returning an updated request-scoped bundle.
    pub async fn refresh_credentials(
        &self,
        kind: StrategyKind,
        opts: &AuthOptions,
    ) -> Result<Credential> {
        let credential = self.resolver.resolve(kind, opts)?;
        self.strategy(kind).refresh(&credential).await
    }
}
