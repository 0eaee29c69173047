use super::*;
use std::collections::HashMap;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, ()> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| map.get(key).cloned().ok_or(())
}

#[test]
fn empty_environment_uses_defaults() {
    let cfg = SessionConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(cfg, SessionConfig::default());
    assert_eq!(cfg.poll_interval, Duration::from_millis(3000));
    assert_eq!(cfg.default_network, Network::Testnet);
    assert_eq!(cfg.client_id, "");
}

#[test]
fn overrides_are_applied() {
    let cfg = SessionConfig::from_lookup(lookup(&[
        ("ZKSESSION_CLIENT_ID", "cid.apps.googleusercontent.com"),
        ("ZKSESSION_ORIGIN", "https://wallet.example/"),
        ("ZKSESSION_RPC_URL", "https://fullnode.mainnet.sui.io:443"),
        ("ZKSESSION_POLL_INTERVAL_MS", "500"),
        ("ZKSESSION_STORAGE_PATH", "/tmp/session.json"),
        ("ZKSESSION_DEFAULT_NETWORK", "mainnet"),
        ("ZKSESSION_HTTP_TIMEOUT_SECS", "3"),
    ]))
    .unwrap();

    assert_eq!(cfg.client_id, "cid.apps.googleusercontent.com");
    assert_eq!(cfg.origin, "https://wallet.example");
    assert_eq!(cfg.rpc_url, "https://fullnode.mainnet.sui.io:443");
    assert_eq!(cfg.poll_interval, Duration::from_millis(500));
    assert_eq!(cfg.storage_path, PathBuf::from("/tmp/session.json"));
    assert_eq!(cfg.default_network, Network::Mainnet);
    assert_eq!(cfg.http_timeout, Duration::from_secs(3));
}

#[test]
fn unparseable_numbers_fall_back_to_defaults() {
    let cfg = SessionConfig::from_lookup(lookup(&[("ZKSESSION_POLL_INTERVAL_MS", "soon")])).unwrap();
    assert_eq!(cfg.poll_interval, Duration::from_millis(DEFAULT_POLL_INTERVAL_MS));
}

#[test]
fn blank_values_fall_back_to_defaults() {
    let cfg = SessionConfig::from_lookup(lookup(&[("ZKSESSION_ORIGIN", "  ")])).unwrap();
    assert_eq!(cfg.origin, DEFAULT_ORIGIN);
}

#[test]
fn unknown_default_network_errors() {
    let err = SessionConfig::from_lookup(lookup(&[("ZKSESSION_DEFAULT_NETWORK", "devnet")])).unwrap_err();
    assert!(err.to_string().contains("ZKSESSION_DEFAULT_NETWORK"));
    assert_eq!(err.error_code(), "E_CONFIG_PARSE");
}
