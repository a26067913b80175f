//! Application state shared across handlers

use common::container::ServiceProvider;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Root provider; every request gets its own scope from it
    pub services: ServiceProvider,
}
