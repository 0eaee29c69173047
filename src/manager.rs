//! Session manager: identity lifecycle over the session store.
//!
//! ARCHITECTURE
//! ============
//! `SessionManager` is the explicit handle every consumer holds. It owns the
//! `SessionStore` and the external collaborators (custody flow, storage,
//! navigator, profile store, balance client) and implements the transitions:
//!
//! - `bootstrap`: restore the persisted identity once at start.
//! - `sync_custody_session`: derive an identity from the custody token.
//! - `login` / `logout`: install or tear down an identity.
//! - `redirect_to_auth_url`: start the login-provider flow.
//! - `refresh_profile`: one profile-poll tick (see `poller`).
//! - `get_balance`: on-demand native-token balance.
//!
//! TRADE-OFFS
//! ==========
//! Every external failure is returned to the caller of the operation that
//! issued it. Profile results are applied only if the identity+address pair
//! they were requested for is still active and no logout happened since,
//! so late responses cannot resurrect a torn-down profile.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::balance::{self, BalanceClient, NATIVE_COIN_TYPE};
use crate::custody::{AuthorizationRequest, CustodyFlow};
use crate::error::SessionResult;
use crate::profile::ProfileStore;
use crate::routes::{self, AUTH_ROUTE, DASHBOARD_ROUTE, LANDING_ROUTE, Navigator};
use crate::session::{Identity, Network, Profile, Session, SessionPatch, SessionStore};
use crate::storage::{NETWORK_KEY, SessionStorage, USER_KEY, USER_ROLE_KEY};
use crate::token;

/// Role given to token-derived identities with no persisted role.
pub const ANONYMOUS_ROLE: &str = "anonymous";
/// Stored role value meaning "no role".
pub const NULL_ROLE_SENTINEL: &str = "null";

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Placeholder fields for identities derived from a custody token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityTemplate {
    pub first_name: String,
    pub last_name: String,
    pub picture: String,
}

impl Default for IdentityTemplate {
    fn default() -> Self {
        Self { first_name: "Wallet".into(), last_name: "User".into(), picture: String::new() }
    }
}

impl IdentityTemplate {
    #[must_use]
    pub fn build(&self, email: &str, role: &str) -> Identity {
        Identity {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: Some(role.to_owned()),
            email: email.to_owned(),
            picture: self.picture.clone(),
        }
    }
}

/// Non-collaborator settings for a [`SessionManager`].
#[derive(Debug, Clone)]
pub struct ManagerOptions {
    /// Origin used to build the `/auth` callback URL.
    pub origin: String,
    /// OAuth client id passed to the login provider.
    pub client_id: String,
    /// Network used when nothing was persisted.
    pub baseline_network: Network,
    pub template: IdentityTemplate,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            origin: "http://localhost:3000".into(),
            client_id: String::new(),
            baseline_network: Network::default(),
            template: IdentityTemplate::default(),
        }
    }
}

/// External capabilities the manager drives.
#[derive(Clone)]
pub struct Collaborators {
    pub custody: Arc<dyn CustodyFlow>,
    pub storage: Arc<dyn SessionStorage>,
    pub navigator: Arc<dyn Navigator>,
    pub profiles: Arc<dyn ProfileStore>,
    pub balances: Arc<dyn BalanceClient>,
}

// =============================================================================
// VIEW
// =============================================================================

/// Read-only snapshot handed to consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountView {
    pub is_connected: bool,
    pub user: Option<Identity>,
    pub address: Option<String>,
    pub profile: Option<Profile>,
    pub network: Network,
    pub loading: bool,
    pub auth_error: Option<String>,
}

/// Outcome of a single profile-poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileTick {
    /// Identity or address absent; profile cleared without a fetch.
    Cleared,
    /// Fetched profile applied.
    Updated,
    /// Fetched profile dropped because the pair changed or polling stopped.
    Discarded,
    /// Fetch failed; profile left as it was.
    Failed,
}

// =============================================================================
// MANAGER
// =============================================================================

pub struct SessionManager {
    store: SessionStore,
    custody: Arc<dyn CustodyFlow>,
    storage: Arc<dyn SessionStorage>,
    navigator: Arc<dyn Navigator>,
    profiles: Arc<dyn ProfileStore>,
    balances: Arc<dyn BalanceClient>,
    options: ManagerOptions,
    bootstrapped: AtomicBool,
    /// Bumped on logout/teardown; profile results from an older epoch are dropped.
    epoch: AtomicU64,
    /// Last token merged by `sync_custody_session`.
    merged_token: Mutex<Option<String>>,
}

impl SessionManager {
    #[must_use]
    pub fn new(collaborators: Collaborators, options: ManagerOptions) -> Self {
        let store = SessionStore::new();
        store.patch(SessionPatch::new().network(options.baseline_network));
        Self {
            store,
            custody: collaborators.custody,
            storage: collaborators.storage,
            navigator: collaborators.navigator,
            profiles: collaborators.profiles,
            balances: collaborators.balances,
            options,
            bootstrapped: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
            merged_token: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.store.snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.store.subscribe()
    }

    #[must_use]
    pub fn address(&self) -> Option<String> {
        self.custody.address()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.address().is_some()
    }

    #[must_use]
    pub fn view(&self) -> AccountView {
        let session = self.store.snapshot();
        let address = self.address();
        AccountView {
            is_connected: address.is_some(),
            user: session.identity,
            address,
            profile: session.profile,
            network: session.network,
            loading: session.loading,
            auth_error: session.auth_error,
        }
    }

    // -------------------------------------------------------------------------
    // Bootstrap
    // -------------------------------------------------------------------------

    /// Restore the persisted identity. Only the first call has any effect.
    ///
    /// Returns `true` if this call performed the bootstrap.
    pub fn bootstrap(&self) -> bool {
        if self.bootstrapped.swap(true, Ordering::SeqCst) {
            return false;
        }

        match self.persisted_identity() {
            Some(identity) => {
                info!(email = %identity.email, "restoring persisted identity");
                self.login(identity);
            }
            None => {
                self.store
                    .patch(SessionPatch::new().identity(None).email_address(None));
            }
        }

        self.store.patch(SessionPatch::new().finish_loading());
        true
    }

    fn persisted_identity(&self) -> Option<Identity> {
        let raw = self.storage.get(USER_KEY)?;
        match serde_json::from_str::<Identity>(&raw) {
            Ok(identity) => Some(identity),
            Err(e) => {
                warn!(error = %e, "discarding unreadable persisted identity");
                self.storage.remove(USER_KEY);
                None
            }
        }
    }

    // -------------------------------------------------------------------------
    // Login
    // -------------------------------------------------------------------------

    /// Install `identity`, persist it, and leave the landing/auth routes.
    pub fn login(&self, identity: Identity) {
        let role = identity
            .role
            .clone()
            .unwrap_or_else(|| NULL_ROLE_SENTINEL.to_owned());

        let encoded = serde_json::to_string(&identity);
        self.store.patch(SessionPatch::new().identity(Some(identity)));

        match encoded {
            Ok(raw) => self.storage.set(USER_KEY, &raw),
            Err(e) => warn!(error = %e, "identity encode failed; not persisted"),
        }
        self.storage.set(USER_ROLE_KEY, &role);

        // Every role lands on the dashboard.
        let route = self.navigator.current_route();
        if routes::redirects_after_login(&route) {
            self.navigator.navigate(DASHBOARD_ROUTE);
        }
    }

    // -------------------------------------------------------------------------
    // Token-derived merge
    // -------------------------------------------------------------------------

    /// Derive an identity from the custody session's token and log it in.
    ///
    /// Does nothing unless an address is present and the custody session
    /// carries a token. A token identical to the last merged one is skipped.
    /// Returns `true` if a merge happened.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SessionError::MalformedToken`] if the token cannot be decoded;
    /// the session is left unchanged.
    pub fn sync_custody_session(&self) -> SessionResult<bool> {
        if !self.is_connected() {
            return Ok(false);
        }
        let Some(jwt) = self.custody.session().and_then(|s| s.jwt) else {
            return Ok(false);
        };

        let mut merged = self
            .merged_token
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if merged.as_deref() == Some(jwt.as_str()) {
            return Ok(false);
        }

        let claims = token::decode_claims(&jwt)?;
        let network = self.persisted_network();
        self.store.patch(
            SessionPatch::new()
                .email_address(Some(claims.email.clone()))
                .network(network),
        );

        let role = self.persisted_role();
        let identity = self.options.template.build(&claims.email, &role);
        info!(email = %claims.email, %role, %network, "identity derived from custody token");
        self.login(identity);

        *merged = Some(jwt);
        Ok(true)
    }

    fn persisted_role(&self) -> String {
        match self.storage.get(USER_ROLE_KEY) {
            Some(role) if role != NULL_ROLE_SENTINEL => role,
            _ => ANONYMOUS_ROLE.to_owned(),
        }
    }

    fn persisted_network(&self) -> Network {
        let Some(raw) = self.storage.get(NETWORK_KEY) else {
            return self.options.baseline_network;
        };
        match raw.parse::<Network>() {
            Ok(network) => network,
            Err(e) => {
                warn!(error = %e, "ignoring persisted network");
                self.options.baseline_network
            }
        }
    }

    // -------------------------------------------------------------------------
    // Logout / teardown
    // -------------------------------------------------------------------------

    /// Tear down the session and return to the landing route.
    ///
    /// Every step runs even if the custody logout fails.
    ///
    /// # Errors
    ///
    /// Returns the custody logout failure after teardown has completed.
    pub async fn logout(&self) -> SessionResult<()> {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.store.patch(
            SessionPatch::new()
                .identity(None)
                .email_address(None)
                .profile(None),
        );
        self.storage.remove(USER_KEY);
        self.storage.remove(USER_ROLE_KEY);
        self.forget_merged_token();

        let result = self.custody.logout().await;
        if let Err(e) = &result {
            warn!(error = %e, "custody logout failed; local session cleared anyway");
        }

        self.storage.clear();
        self.navigator.navigate(LANDING_ROUTE);
        info!("session logged out");
        result
    }

    /// Reset the in-memory session when its owner goes away. Storage is kept.
    pub fn teardown(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.forget_merged_token();
        self.store.patch(
            SessionPatch::new()
                .identity(None)
                .email_address(None)
                .profile(None)
                .network(self.options.baseline_network)
                .auth_error(None),
        );
    }

    fn forget_merged_token(&self) {
        *self
            .merged_token
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
    }

    // -------------------------------------------------------------------------
    // Redirect to auth
    // -------------------------------------------------------------------------

    /// Start the login-provider flow for `network` (default mainnet).
    ///
    /// Navigates to `/auth` first, then to the provider URL once it resolves.
    /// On failure the user stays on `/auth` and `auth_error` is set.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SessionError::AuthorizationUrl`] if the provider gives no URL.
    pub async fn redirect_to_auth_url(&self, network: Option<Network>) -> SessionResult<String> {
        let network = network.unwrap_or(Network::Mainnet);
        self.navigator.navigate(AUTH_ROUTE);
        self.store.patch(SessionPatch::new().auth_error(None));

        let redirect_url = format!("{}{AUTH_ROUTE}", self.options.origin.trim_end_matches('/'));
        let request = AuthorizationRequest::google(network, &self.options.client_id, &redirect_url);

        match self.custody.create_authorization_url(&request).await {
            Ok(url) => {
                self.storage.set(NETWORK_KEY, network.as_str());
                self.navigator.navigate(&url);
                Ok(url)
            }
            Err(e) => {
                error!(error = %e, %network, "authorization url request failed");
                self.store
                    .patch(SessionPatch::new().auth_error(Some(e.to_string())));
                Err(e)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Profile refresh
    // -------------------------------------------------------------------------

    /// Run one profile-poll tick.
    pub async fn refresh_profile(&self) -> ProfileTick {
        self.refresh_profile_until(None).await
    }

    /// Run one profile-poll tick, dropping the result if `cancel` flips to true
    /// before it arrives.
    pub(crate) async fn refresh_profile_until(&self, cancel: Option<&watch::Receiver<bool>>) -> ProfileTick {
        let Some((email, address)) = self.active_pair() else {
            self.store.patch(SessionPatch::new().profile(None));
            return ProfileTick::Cleared;
        };

        let epoch = self.epoch.load(Ordering::SeqCst);
        let profile = match self.profiles.fetch(&email, &address).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(error = %e, %email, %address, "profile fetch failed");
                return ProfileTick::Failed;
            }
        };

        let cancelled = cancel.is_some_and(|rx| *rx.borrow());
        let same_address = self.address().as_deref() == Some(address.as_str());

        // Logout and teardown bump the epoch before clearing the identity, so
        // either the epoch check fails here or their clear lands after this write.
        let applied = !cancelled
            && same_address
            && self.store.patch_if(
                |session| {
                    self.epoch.load(Ordering::SeqCst) == epoch
                        && session.identity.as_ref().is_some_and(|identity| identity.email == email)
                },
                SessionPatch::new().profile(Some(profile)),
            );
        if !applied {
            debug!(%email, %address, cancelled, "discarding stale profile result");
            return ProfileTick::Discarded;
        }
        ProfileTick::Updated
    }

    fn active_pair(&self) -> Option<(String, String)> {
        let email = self
            .store
            .read(|s| s.identity.as_ref().map(|identity| identity.email.clone()))?;
        let address = self.address()?;
        Some((email, address))
    }

    // -------------------------------------------------------------------------
    // Balance
    // -------------------------------------------------------------------------

    /// Native-token balance of the current address in whole tokens.
    ///
    /// Returns `0.0` without a request when there is no address.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SessionError::BalanceQuery`] if the balance client fails or
    /// reports an unparseable amount.
    pub async fn get_balance(&self) -> SessionResult<f64> {
        let Some(address) = self.address() else {
            return Ok(0.0);
        };
        let raw = self
            .balances
            .get_balance(&address, NATIVE_COIN_TYPE)
            .await?;
        balance::to_whole_tokens(&raw)
    }
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod tests;
