//! Application state for the staffing portal API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use sqlx::SqlitePool;

use crate::config::ConfigLoader;

use super::auth::TokenSigner;

/// Shared application state.
///
/// Contains resources that are shared across all request handlers: the
/// database pool, the loaded portal configuration and the token signer.
#[derive(Clone)]
pub struct AppState {
    pool: SqlitePool,
    config: Arc<ConfigLoader>,
    tokens: Arc<TokenSigner>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(pool: SqlitePool, config: ConfigLoader, tokens: TokenSigner) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            tokens: Arc::new(tokens),
        }
    }

    /// Returns the database pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns a reference to the configuration loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    /// Returns the token signer.
    pub fn tokens(&self) -> &TokenSigner {
        &self.tokens
    }

    /// Today's date in office-local time.
    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
