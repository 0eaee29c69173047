//! Delegated-custody (zkLogin) flow seam.
//!
//! ARCHITECTURE
//! ============
//! The custody provider owns the OAuth exchange and the derived on-chain
//! address. The session manager only reads the current custody session and
//! address, asks for an authorization URL, and requests logout.
//! `LocalCustodyFlow` is the concrete flow used by the binary: it builds the
//! Google authorization URL itself and accepts the completed login (token and
//! address) from the host, keeping both in session storage.

use std::sync::Arc;

use url::Url;

use crate::error::SessionError;
use crate::session::Network;
use crate::storage::SessionStorage;

pub const GOOGLE_PROVIDER: &str = "google";
pub const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
/// Scopes requested from the login provider.
pub const AUTH_SCOPES: [&str; 3] = ["openid", "email", "profile"];

pub const CUSTODY_JWT_KEY: &str = "zklogin:jwt";
pub const CUSTODY_ADDRESS_KEY: &str = "zklogin:address";

/// A live delegated-custody session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustodySession {
    /// Identity token issued by the login provider, once the exchange finished.
    pub jwt: Option<String>,
}

/// Parameters for an authorization-URL request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub provider: String,
    pub network: Network,
    pub client_id: String,
    pub redirect_url: String,
    pub scopes: Vec<String>,
}

impl AuthorizationRequest {
    /// Google request with the fixed `openid email profile` scopes.
    #[must_use]
    pub fn google(network: Network, client_id: &str, redirect_url: &str) -> Self {
        Self {
            provider: GOOGLE_PROVIDER.to_owned(),
            network,
            client_id: client_id.to_owned(),
            redirect_url: redirect_url.to_owned(),
            scopes: AUTH_SCOPES.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

/// Delegated-custody capability consumed by the session manager.
#[async_trait::async_trait]
pub trait CustodyFlow: Send + Sync {
    /// Current custody session, if one exists.
    fn session(&self) -> Option<CustodySession>;

    /// On-chain address derived from the custody session.
    fn address(&self) -> Option<String>;

    /// Ask the provider for the URL that starts authorization.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AuthorizationUrl`] if no URL can be produced.
    async fn create_authorization_url(&self, request: &AuthorizationRequest) -> Result<String, SessionError>;

    /// Drop the custody session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Logout`] if the provider rejects the call.
    async fn logout(&self) -> Result<(), SessionError>;
}

// =============================================================================
// LOCAL FLOW
// =============================================================================

/// Custody flow that keeps the completed login in session storage.
pub struct LocalCustodyFlow {
    storage: Arc<dyn SessionStorage>,
    authorize_url: String,
}

impl LocalCustodyFlow {
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage, authorize_url: GOOGLE_AUTHORIZE_URL.to_owned() }
    }

    /// Override the provider authorization endpoint.
    #[must_use]
    pub fn with_authorize_url(mut self, authorize_url: &str) -> Self {
        self.authorize_url = authorize_url.to_owned();
        self
    }

    /// Record a finished login: the provider's identity token and the derived address.
    pub fn complete_login(&self, jwt: &str, address: &str) {
        self.storage.set(CUSTODY_JWT_KEY, jwt);
        self.storage.set(CUSTODY_ADDRESS_KEY, address);
        tracing::info!(%address, "custody session established");
    }
}

#[async_trait::async_trait]
impl CustodyFlow for LocalCustodyFlow {
    fn session(&self) -> Option<CustodySession> {
        let jwt = self.storage.get(CUSTODY_JWT_KEY)?;
        Some(CustodySession { jwt: Some(jwt) })
    }

    fn address(&self) -> Option<String> {
        self.storage.get(CUSTODY_ADDRESS_KEY)
    }

    async fn create_authorization_url(&self, request: &AuthorizationRequest) -> Result<String, SessionError> {
        if request.provider != GOOGLE_PROVIDER {
            return Err(SessionError::AuthorizationUrl(format!("unsupported provider: {}", request.provider)));
        }
        if request.client_id.is_empty() {
            return Err(SessionError::AuthorizationUrl("missing client id".into()));
        }

        let mut url = Url::parse(&self.authorize_url).map_err(|e| SessionError::AuthorizationUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("client_id", &request.client_id)
            .append_pair("redirect_uri", &request.redirect_url)
            .append_pair("response_type", "id_token")
            .append_pair("scope", &request.scopes.join(" "));

        tracing::debug!(network = %request.network, "authorization url built");
        Ok(url.into())
    }

    async fn logout(&self) -> Result<(), SessionError> {
        self.storage.remove(CUSTODY_JWT_KEY);
        self.storage.remove(CUSTODY_ADDRESS_KEY);
        Ok(())
    }
}

#[cfg(test)]
#[path = "custody_test.rs"]
mod tests;
