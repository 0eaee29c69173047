use super::*;

fn balance(raw: &str) -> Balance {
    Balance { total_balance: raw.to_owned() }
}

// =============================================================================
// to_whole_tokens
// =============================================================================

#[test]
fn five_billion_mist_is_five_sui() {
    assert!((to_whole_tokens(&balance("5000000000")).unwrap() - 5.0).abs() < f64::EPSILON);
}

#[test]
fn zero_balance_is_zero() {
    assert_eq!(to_whole_tokens(&balance("0")).unwrap(), 0.0);
}

#[test]
fn fractional_balance_scales() {
    assert!((to_whole_tokens(&balance("1500000")).unwrap() - 0.0015).abs() < 1e-12);
}

#[test]
fn non_numeric_balance_is_error() {
    let err = to_whole_tokens(&balance("lots")).unwrap_err();
    assert!(matches!(err, SessionError::BalanceQuery(_)));
}

#[test]
fn negative_balance_is_error() {
    assert!(to_whole_tokens(&balance("-1")).is_err());
}

// =============================================================================
// parse_response
// =============================================================================

#[test]
fn parse_result_payload() {
    let json = r#"{"jsonrpc":"2.0","id":1,"result":{"coinType":"0x2::sui::SUI","coinObjectCount":2,"totalBalance":"5000000000","lockedBalance":{}}}"#;
    assert_eq!(parse_response(json).unwrap(), balance("5000000000"));
}

#[test]
fn parse_error_payload() {
    let json = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"Invalid params"}}"#;
    let err = parse_response(json).unwrap_err();
    assert!(err.to_string().contains("-32602"));
    assert!(err.to_string().contains("Invalid params"));
}

#[test]
fn parse_empty_payload() {
    let err = parse_response(r#"{"jsonrpc":"2.0","id":1}"#).unwrap_err();
    assert!(err.to_string().contains("no result"));
}

#[test]
fn parse_garbage_payload() {
    assert!(parse_response("<html>").is_err());
}
