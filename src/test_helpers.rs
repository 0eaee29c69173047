//! Mock collaborators shared by the unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use tokio::sync::Semaphore;

use crate::balance::{Balance, BalanceClient};
use crate::custody::{AuthorizationRequest, CustodyFlow, CustodySession};
use crate::error::SessionError;
use crate::manager::{Collaborators, ManagerOptions, SessionManager};
use crate::profile::ProfileStore;
use crate::routes::{LANDING_ROUTE, RouteHistory};
use crate::session::Profile;
use crate::storage::MemoryStorage;

fn guard<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Unsigned compact JWT whose payload is `{"email": email}`.
pub fn jwt_for(email: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::json!({ "email": email, "sub": "sub-1" }).to_string());
    format!("{header}.{payload}.sig")
}

// =============================================================================
// MockCustody
// =============================================================================

#[derive(Default)]
pub struct MockCustody {
    session: Mutex<Option<CustodySession>>,
    address: Mutex<Option<String>>,
    auth_url_error: Mutex<Option<String>>,
    logout_error: Mutex<Option<String>>,
    pub url_requests: Mutex<Vec<AuthorizationRequest>>,
    pub logout_calls: AtomicUsize,
}

impl MockCustody {
    pub fn connect(&self, jwt: &str, address: &str) {
        *guard(&self.session) = Some(CustodySession { jwt: Some(jwt.to_owned()) });
        *guard(&self.address) = Some(address.to_owned());
    }

    pub fn set_session(&self, session: Option<CustodySession>) {
        *guard(&self.session) = session;
    }

    pub fn set_address(&self, address: Option<&str>) {
        *guard(&self.address) = address.map(str::to_owned);
    }

    pub fn fail_authorization(&self, message: &str) {
        *guard(&self.auth_url_error) = Some(message.to_owned());
    }

    pub fn fail_logout(&self, message: &str) {
        *guard(&self.logout_error) = Some(message.to_owned());
    }

    pub fn last_request(&self) -> Option<AuthorizationRequest> {
        guard(&self.url_requests).last().cloned()
    }
}

#[async_trait::async_trait]
impl CustodyFlow for MockCustody {
    fn session(&self) -> Option<CustodySession> {
        guard(&self.session).clone()
    }

    fn address(&self) -> Option<String> {
        guard(&self.address).clone()
    }

    async fn create_authorization_url(&self, request: &AuthorizationRequest) -> Result<String, SessionError> {
        guard(&self.url_requests).push(request.clone());
        match guard(&self.auth_url_error).clone() {
            Some(message) => Err(SessionError::AuthorizationUrl(message)),
            None => Ok(format!("https://accounts.example/authorize?client_id={}", request.client_id)),
        }
    }

    async fn logout(&self) -> Result<(), SessionError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        *guard(&self.session) = None;
        *guard(&self.address) = None;
        match guard(&self.logout_error).clone() {
            Some(message) => Err(SessionError::Logout(message)),
            None => Ok(()),
        }
    }
}

// =============================================================================
// MockProfiles
// =============================================================================

pub struct MockProfiles {
    pub calls: Mutex<Vec<(String, String)>>,
    response: Mutex<Profile>,
    fail: AtomicBool,
    /// When set, each fetch waits for one permit before answering.
    gate: Option<Arc<Semaphore>>,
}

impl MockProfiles {
    pub fn new(response: Profile) -> Self {
        Self { calls: Mutex::new(Vec::new()), response: Mutex::new(response), fail: AtomicBool::new(false), gate: None }
    }

    pub fn gated(response: Profile, gate: Arc<Semaphore>) -> Self {
        Self { gate: Some(gate), ..Self::new(response) }
    }

    pub fn set_response(&self, response: Profile) {
        *guard(&self.response) = response;
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        guard(&self.calls).len()
    }

    pub fn recorded(&self) -> Vec<(String, String)> {
        guard(&self.calls).clone()
    }
}

#[async_trait::async_trait]
impl ProfileStore for MockProfiles {
    async fn fetch(&self, email: &str, address: &str) -> Result<Profile, SessionError> {
        guard(&self.calls).push((email.to_owned(), address.to_owned()));
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(SessionError::ProfileFetch("store unavailable".into()));
        }
        Ok(guard(&self.response).clone())
    }
}

// =============================================================================
// MockBalances
// =============================================================================

pub struct MockBalances {
    pub calls: AtomicUsize,
    result: Mutex<Result<String, String>>,
}

impl MockBalances {
    pub fn returning(total: &str) -> Self {
        Self { calls: AtomicUsize::new(0), result: Mutex::new(Ok(total.to_owned())) }
    }

    pub fn failing(message: &str) -> Self {
        Self { calls: AtomicUsize::new(0), result: Mutex::new(Err(message.to_owned())) }
    }
}

#[async_trait::async_trait]
impl BalanceClient for MockBalances {
    async fn get_balance(&self, _owner: &str, _coin_type: &str) -> Result<Balance, SessionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        guard(&self.result)
            .clone()
            .map(|total_balance| Balance { total_balance })
            .map_err(SessionError::BalanceQuery)
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub manager: Arc<SessionManager>,
    pub custody: Arc<MockCustody>,
    pub storage: Arc<MemoryStorage>,
    pub navigator: Arc<RouteHistory>,
    pub profiles: Arc<MockProfiles>,
    pub balances: Arc<MockBalances>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(LANDING_ROUTE, MockProfiles::new(serde_json::json!({ "points": 1 })), MockBalances::returning("0"))
    }

    pub fn at_route(route: &str) -> Self {
        Self::build(route, MockProfiles::new(serde_json::json!({ "points": 1 })), MockBalances::returning("0"))
    }

    pub fn with_profiles(profiles: MockProfiles) -> Self {
        Self::build(LANDING_ROUTE, profiles, MockBalances::returning("0"))
    }

    pub fn with_balances(balances: MockBalances) -> Self {
        Self::build(LANDING_ROUTE, MockProfiles::new(serde_json::json!({})), balances)
    }

    pub fn build(route: &str, profiles: MockProfiles, balances: MockBalances) -> Self {
        Self::build_with(route, profiles, balances, Arc::new(MemoryStorage::new()), ManagerOptions::default())
    }

    pub fn build_with(
        route: &str,
        profiles: MockProfiles,
        balances: MockBalances,
        storage: Arc<MemoryStorage>,
        options: ManagerOptions,
    ) -> Self {
        let custody = Arc::new(MockCustody::default());
        let navigator = Arc::new(RouteHistory::new(route));
        let profiles = Arc::new(profiles);
        let balances = Arc::new(balances);
        let manager = Arc::new(SessionManager::new(
            Collaborators {
                custody: custody.clone(),
                storage: storage.clone(),
                navigator: navigator.clone(),
                profiles: profiles.clone(),
                balances: balances.clone(),
            },
            options,
        ));
        Self { manager, custody, storage, navigator, profiles, balances }
    }
}
