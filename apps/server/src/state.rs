//! Shared application state.
//!
//! One `Database` handle (a pooled connection set) is shared by every
//! handler through axum's `State` extractor.

use mostrador_db::Database;

/// State available to all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}
