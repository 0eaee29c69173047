//! Session record and the merge-patch store that owns it.
//!
//! DESIGN
//! ======
//! `SessionStore` is the single serialization point for session mutation.
//! Every transition is a `SessionPatch` merged into the current record;
//! fields a patch does not mention are left untouched. The record lives in a
//! `tokio::sync::watch` channel so subscribers observe each patch as one
//! atomic update and can recompute derived views from it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::SessionError;

/// Opaque application profile returned by the profile store.
pub type Profile = serde_json::Value;

// =============================================================================
// NETWORK
// =============================================================================

/// Chain network the session operates against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    /// Baseline network for a fresh session.
    #[default]
    Testnet,
}

impl Network {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            other => Err(SessionError::UnknownNetwork(other.to_owned())),
        }
    }
}

// =============================================================================
// IDENTITY
// =============================================================================

/// Application-level identity. Persisted as camelCase JSON under the `user` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Identity {
    pub first_name: String,
    pub last_name: String,
    /// `None` is tolerated and persisted as the `"null"` role sentinel.
    pub role: Option<String>,
    pub email: String,
    pub picture: String,
}

// =============================================================================
// SESSION
// =============================================================================

/// The single owned session record.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub identity: Option<Identity>,
    /// Email claim from the decoded identity token.
    pub email_address: Option<String>,
    /// True only until the first bootstrap pass completes.
    pub loading: bool,
    pub profile: Option<Profile>,
    pub network: Network,
    /// Visible error from the last failed authorization redirect.
    pub auth_error: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            identity: None,
            email_address: None,
            loading: true,
            profile: None,
            network: Network::default(),
            auth_error: None,
        }
    }
}

// =============================================================================
// PATCH
// =============================================================================

/// Partial update to a [`Session`].
///
/// An outer `None` leaves the field untouched; `Some(None)` clears it.
/// `loading` can only be cleared, never set back to true.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionPatch {
    identity: Option<Option<Identity>>,
    email_address: Option<Option<String>>,
    loading_done: bool,
    profile: Option<Option<Profile>>,
    network: Option<Network>,
    auth_error: Option<Option<String>>,
}

impl SessionPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn identity(mut self, identity: Option<Identity>) -> Self {
        self.identity = Some(identity);
        self
    }

    #[must_use]
    pub fn email_address(mut self, email: Option<String>) -> Self {
        self.email_address = Some(email);
        self
    }

    /// Mark the bootstrap pass as finished.
    #[must_use]
    pub fn finish_loading(mut self) -> Self {
        self.loading_done = true;
        self
    }

    #[must_use]
    pub fn profile(mut self, profile: Option<Profile>) -> Self {
        self.profile = Some(profile);
        self
    }

    #[must_use]
    pub fn network(mut self, network: Network) -> Self {
        self.network = Some(network);
        self
    }

    #[must_use]
    pub fn auth_error(mut self, error: Option<String>) -> Self {
        self.auth_error = Some(error);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge this patch into `session`.
    pub fn apply_to(self, session: &mut Session) {
        if let Some(identity) = self.identity {
            session.identity = identity;
        }
        if let Some(email) = self.email_address {
            session.email_address = email;
        }
        if self.loading_done {
            session.loading = false;
        }
        if let Some(profile) = self.profile {
            session.profile = profile;
        }
        if let Some(network) = self.network {
            session.network = network;
        }
        if let Some(error) = self.auth_error {
            session.auth_error = error;
        }
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Owner of the [`Session`] record. Cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct SessionStore {
    tx: watch::Sender<Session>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_session(Session::default())
    }

    #[must_use]
    pub fn with_session(session: Session) -> Self {
        let (tx, _rx) = watch::channel(session);
        Self { tx }
    }

    /// Merge `patch` into the current session and notify subscribers.
    pub fn patch(&self, patch: SessionPatch) {
        self.tx.send_modify(|session| patch.apply_to(session));
    }

    /// Merge `patch` only if `accept` holds for the current session.
    ///
    /// The check and the write happen under the same channel lock, so no other
    /// patch can land in between. Subscribers are notified only when applied.
    pub fn patch_if(&self, accept: impl FnOnce(&Session) -> bool, patch: SessionPatch) -> bool {
        self.tx.send_if_modified(|session| {
            if !accept(session) {
                return false;
            }
            patch.apply_to(session);
            true
        })
    }

    /// Clone of the current session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// Run `f` against the current session without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Receiver that observes every subsequent patch.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
