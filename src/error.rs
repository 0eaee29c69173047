//! Session error taxonomy.
//!
//! DESIGN
//! ======
//! Token decode failures abort only the derivation attempt that hit them.
//! External-call failures (profile, balance, authorization URL, logout) are
//! local to the operation that issued the call and never touch unrelated
//! session fields. Missing identity or address is not an error at all.

/// Errors produced by session operations and their collaborators.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The identity token could not be decoded into claims.
    #[error("malformed identity token: {0}")]
    MalformedToken(String),

    /// The balance client rejected the request or returned an unusable value.
    #[error("balance query failed: {0}")]
    BalanceQuery(String),

    /// The profile store rejected the request.
    #[error("profile fetch failed: {0}")]
    ProfileFetch(String),

    /// The login provider could not produce an authorization URL.
    #[error("authorization url request failed: {0}")]
    AuthorizationUrl(String),

    /// The delegated-custody logout call failed.
    #[error("custody logout failed: {0}")]
    Logout(String),

    /// Persisted storage could not be opened or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// A network tag outside the supported set.
    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl SessionError {
    /// Stable machine-readable code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedToken(_) => "E_MALFORMED_TOKEN",
            Self::BalanceQuery(_) => "E_BALANCE_QUERY",
            Self::ProfileFetch(_) => "E_PROFILE_FETCH",
            Self::AuthorizationUrl(_) => "E_AUTHORIZATION_URL",
            Self::Logout(_) => "E_LOGOUT",
            Self::Storage(_) => "E_STORAGE",
            Self::UnknownNetwork(_) => "E_UNKNOWN_NETWORK",
            Self::ConfigParse(_) => "E_CONFIG_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    /// Whether the caller may reasonably retry the same operation.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::BalanceQuery(_) | Self::ProfileFetch(_) | Self::AuthorizationUrl(_) | Self::Logout(_)
        )
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
