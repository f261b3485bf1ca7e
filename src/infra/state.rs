//! Global application state.
//!
//! Used for access to common resources such as
//! the application configuration.

use super::config::Config;
use axum::extract::FromRef;

/// Global application state.
#[derive(Clone, Debug, FromRef)]
pub struct AppState {
    config: Config,
}

impl AppState {
    /// Constructs a new [`AppState`].
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Returns the application configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}
