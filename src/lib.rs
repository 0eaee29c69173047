//! Client-side session state for zkLogin wallets.
//!
//! SYSTEM CONTEXT
//! ==============
//! A wallet front end holds one `SessionManager`. It restores the identity
//! persisted in session storage, derives a fresh identity from the login
//! provider's token once the delegated-custody session exists, keeps the
//! application profile for the active identity+address pair fresh through a
//! `ProfilePoller`, and exposes login, logout, and balance operations.
//!
//! The custody flow, RPC node, profile store, and navigator are traits so a
//! host can plug in its own; concrete HTTP and in-memory implementations are
//! provided alongside.

pub mod balance;
pub mod config;
pub mod custody;
pub mod error;
pub mod manager;
pub mod poller;
pub mod profile;
pub mod routes;
pub mod session;
pub mod storage;
pub mod token;

#[cfg(test)]
mod test_helpers;

pub use balance::{Balance, BalanceClient, SuiRpcClient};
pub use config::SessionConfig;
pub use custody::{AuthorizationRequest, CustodyFlow, CustodySession, LocalCustodyFlow};
pub use error::{SessionError, SessionResult};
pub use manager::{AccountView, Collaborators, IdentityTemplate, ManagerOptions, ProfileTick, SessionManager};
pub use poller::ProfilePoller;
pub use profile::{HttpProfileStore, ProfileStore};
pub use routes::{Navigator, RouteHistory};
pub use session::{Identity, Network, Profile, Session, SessionPatch, SessionStore};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
