//! Reminder API - in-memory reminder tracking service
//!
//! This crate provides:
//! - An ordered in-memory reminder store with create, query, update, and delete
//! - HTTP API over the store, plus a Server-Sent Events change stream
//! - TOML configuration with environment overrides
//!
//! # Usage
//!
//! As a library:
//! ```ignore
//! use reminder_api::{Config, Core};
//!
//! let core = Core::new(Config::default());
//! // core.start_api_server().await.unwrap();
//! ```
//!
//! As a standalone server (CLI):
//! ```text
//! reminder-api --config ~/.reminder-api/config.toml
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod store;

// Re-export main types for convenience
pub use config::Config;
pub use error::{CoreError, Result};
pub use store::{Reminder, ReminderStore};

use std::sync::Arc;
use store::ReminderEvent;
use tokio::sync::broadcast;

/// Core service that owns the store and serves it over HTTP
pub struct Core {
    /// Configuration
    pub config: Config,

    /// Reminder collection, shared with the HTTP handlers
    store: Arc<ReminderStore>,

    /// Broadcast channel for SSE events (from handlers to API clients)
    event_tx: broadcast::Sender<ReminderEvent>,
}

impl Core {
    /// Create a new Core instance with an empty store
    pub fn new(config: Config) -> Self {
        Self::with_store(config, Arc::new(ReminderStore::new()))
    }

    /// Create a Core instance around an existing store
    pub fn with_store(config: Config, store: Arc<ReminderStore>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Core {
            config,
            store,
            event_tx,
        }
    }

    /// Start the HTTP API server (blocks until shutdown)
    pub async fn start_api_server(&self) -> Result<()> {
        let addr = self.config.server_addr();
        tracing::info!("Starting API server on {}", addr);
        api::serve(addr, self.store.clone(), &self.config, self.event_tx.clone()).await
    }

    /// Get a reference to the store
    pub fn store(&self) -> &Arc<ReminderStore> {
        &self.store
    }
}
