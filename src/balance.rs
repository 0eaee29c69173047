//! Native-token balance queries.
//!
//! Thin JSON-RPC wrapper for `suix_getBalance`. Pure parsing in
//! `parse_response` for testability.

use std::time::Duration;

use serde::Deserialize;

use crate::error::SessionError;

/// Coin type of the chain's native token.
pub const NATIVE_COIN_TYPE: &str = "0x2::sui::SUI";
/// Base units per whole native token (10^9).
pub const MIST_PER_SUI: f64 = 1_000_000_000.0;

/// Raw balance as reported by the RPC node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    /// Integer amount in base units, encoded as a decimal string.
    pub total_balance: String,
}

/// Balance lookup capability.
#[async_trait::async_trait]
pub trait BalanceClient: Send + Sync {
    /// # Errors
    ///
    /// Returns [`SessionError::BalanceQuery`] if the node rejects the request.
    async fn get_balance(&self, owner: &str, coin_type: &str) -> Result<Balance, SessionError>;
}

/// Scale a raw base-unit balance down to whole tokens.
///
/// # Errors
///
/// Returns [`SessionError::BalanceQuery`] if `total_balance` is not an unsigned integer.
#[allow(clippy::cast_precision_loss)]
pub fn to_whole_tokens(balance: &Balance) -> Result<f64, SessionError> {
    let raw: u128 = balance
        .total_balance
        .trim()
        .parse()
        .map_err(|_| SessionError::BalanceQuery(format!("invalid totalBalance: {:?}", balance.total_balance)))?;
    Ok(raw as f64 / MIST_PER_SUI)
}

// =============================================================================
// JSON-RPC CLIENT
// =============================================================================

pub struct SuiRpcClient {
    http: reqwest::Client,
    rpc_url: String,
}

impl SuiRpcClient {
    /// # Errors
    ///
    /// Returns [`SessionError::HttpClientBuild`] if the HTTP client cannot be built.
    pub fn new(rpc_url: &str, timeout: Duration) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SessionError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, rpc_url: rpc_url.to_owned() })
    }
}

#[async_trait::async_trait]
impl BalanceClient for SuiRpcClient {
    async fn get_balance(&self, owner: &str, coin_type: &str) -> Result<Balance, SessionError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "suix_getBalance",
            "params": [owner, coin_type],
        });

        let resp = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SessionError::BalanceQuery(e.to_string()))?;

        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| SessionError::BalanceQuery(e.to_string()))?;

        if status != 200 {
            return Err(SessionError::BalanceQuery(format!("status {status}: {text}")));
        }

        parse_response(&text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Balance>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

fn parse_response(json: &str) -> Result<Balance, SessionError> {
    let resp: RpcResponse = serde_json::from_str(json).map_err(|e| SessionError::BalanceQuery(e.to_string()))?;
    if let Some(err) = resp.error {
        return Err(SessionError::BalanceQuery(format!("rpc error {}: {}", err.code, err.message)));
    }
    resp.result
        .ok_or_else(|| SessionError::BalanceQuery("rpc response has no result".into()))
}

#[cfg(test)]
#[path = "balance_test.rs"]
mod tests;
