//! Identity-token decoding.
//!
//! Reads the claims segment of a compact JWT issued by the login provider.
//! The signature is not checked here; the token only seeds the local
//! identity and grants nothing by itself.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

use crate::error::SessionError;

/// Claims the session cares about. Everything else is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenClaims {
    pub email: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Decode the payload segment of `token` into [`TokenClaims`].
///
/// Both base64 alphabets are accepted, with or without padding.
///
/// # Errors
///
/// Returns [`SessionError::MalformedToken`] if the token lacks a payload
/// segment, the segment is not base64, or the JSON has no string `email`.
pub fn decode_claims(token: &str) -> Result<TokenClaims, SessionError> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| SessionError::MalformedToken("missing payload segment".into()))?;

    let normalized: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD
        .decode(normalized.as_bytes())
        .map_err(|e| SessionError::MalformedToken(format!("payload is not base64: {e}")))?;

    serde_json::from_slice(&bytes).map_err(|e| SessionError::MalformedToken(format!("payload is not valid claims: {e}")))
}

#[cfg(test)]
#[path = "token_test.rs"]
mod tests;
