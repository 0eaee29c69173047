use super::*;

#[test]
fn landing_and_auth_redirect_after_login() {
    assert!(redirects_after_login(LANDING_ROUTE));
    assert!(redirects_after_login(AUTH_ROUTE));
}

#[test]
fn other_routes_do_not_redirect() {
    assert!(!redirects_after_login(DASHBOARD_ROUTE));
    assert!(!redirects_after_login("/settings"));
    assert!(!redirects_after_login("/auth/callback"));
}

#[test]
fn history_starts_at_initial_route() {
    let history = RouteHistory::new("/settings");
    assert_eq!(history.current_route(), "/settings");
    assert_eq!(history.visited(), vec!["/settings".to_owned()]);
}

#[test]
fn history_default_is_landing() {
    assert_eq!(RouteHistory::default().current_route(), LANDING_ROUTE);
}

#[test]
fn navigate_pushes_route() {
    let history = RouteHistory::default();
    history.navigate(AUTH_ROUTE);
    history.navigate(DASHBOARD_ROUTE);
    assert_eq!(history.current_route(), DASHBOARD_ROUTE);
    assert_eq!(history.visited(), vec!["/", "/auth", "/dashboard"]);
}
