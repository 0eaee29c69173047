//! Profile store seam and its HTTP implementation.

use std::time::Duration;

use url::Url;

use crate::error::SessionError;
use crate::session::Profile;

/// Fetches the application profile for an `(email, address)` pair.
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    /// # Errors
    ///
    /// Returns [`SessionError::ProfileFetch`] if the store rejects the request.
    async fn fetch(&self, email: &str, address: &str) -> Result<Profile, SessionError>;
}

/// Profile store reached over HTTP: `GET {base}/profiles?email=..&address=..`.
pub struct HttpProfileStore {
    http: reqwest::Client,
    base_url: String,
}

impl HttpProfileStore {
    /// # Errors
    ///
    /// Returns [`SessionError::HttpClientBuild`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SessionError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    fn profile_url(&self, email: &str, address: &str) -> Result<Url, SessionError> {
        let mut url = Url::parse(&format!("{}/profiles", self.base_url))
            .map_err(|e| SessionError::ProfileFetch(format!("invalid profile url: {e}")))?;
        url.query_pairs_mut()
            .append_pair("email", email)
            .append_pair("address", address);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl ProfileStore for HttpProfileStore {
    async fn fetch(&self, email: &str, address: &str) -> Result<Profile, SessionError> {
        let url = self.profile_url(email, address)?;
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| SessionError::ProfileFetch(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SessionError::ProfileFetch(format!("status {}", status.as_u16())));
        }

        resp.json::<Profile>()
            .await
            .map_err(|e| SessionError::ProfileFetch(e.to_string()))
    }
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
