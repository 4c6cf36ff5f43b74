use std::sync::Arc;

use sitetrack_core::storage::AttachmentStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: sitetrack_db::DbPool,
    /// Server configuration, including the JWT signing secret.
    pub config: Arc<ServerConfig>,
    /// On-disk store for update attachments.
    pub attachments: Arc<AttachmentStore>,
}

impl AppState {
    /// Assemble state, rooting the attachment store at `config.upload_dir`.
    pub fn new(pool: sitetrack_db::DbPool, config: Arc<ServerConfig>) -> Self {
        let attachments = Arc::new(AttachmentStore::new(config.upload_dir.clone()));
        Self {
            pool,
            config,
            attachments,
        }
    }
}
