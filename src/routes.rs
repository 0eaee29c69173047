//! Route navigation seam.
//!
//! The manager only needs to know the current route and to push a new one.
//! Authorization URLs are pushed through the same call.

use std::sync::Mutex;

pub const LANDING_ROUTE: &str = "/";
pub const AUTH_ROUTE: &str = "/auth";
pub const DASHBOARD_ROUTE: &str = "/dashboard";

/// Host navigation capability.
pub trait Navigator: Send + Sync {
    /// Path of the route currently shown.
    fn current_route(&self) -> String;
    /// Push `path` (a route or an absolute URL).
    fn navigate(&self, path: &str);
}

/// Routes from which a fresh login is sent to the dashboard.
#[must_use]
pub fn redirects_after_login(route: &str) -> bool {
    route == LANDING_ROUTE || route == AUTH_ROUTE
}

/// In-memory navigator that records every push.
#[derive(Debug)]
pub struct RouteHistory {
    stack: Mutex<Vec<String>>,
}

impl RouteHistory {
    #[must_use]
    pub fn new(initial: &str) -> Self {
        Self { stack: Mutex::new(vec![initial.to_owned()]) }
    }

    /// Every route visited, oldest first, including the initial one.
    #[must_use]
    pub fn visited(&self) -> Vec<String> {
        self.stack
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl Default for RouteHistory {
    fn default() -> Self {
        Self::new(LANDING_ROUTE)
    }
}

impl Navigator for RouteHistory {
    fn current_route(&self) -> String {
        self.stack
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .last()
            .cloned()
            .unwrap_or_else(|| LANDING_ROUTE.to_owned())
    }

    fn navigate(&self, path: &str) {
        tracing::debug!(%path, "navigate");
        self.stack
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(path.to_owned());
    }
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
