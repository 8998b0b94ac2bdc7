use std::sync::Arc;

use tracing::{info, warn};

use shared_config::{AppConfig, StoreBackend};

use crate::memory::MemoryStore;
use crate::store::ClinicStore;
use crate::supabase::SupabaseStore;

/// Shared router state: configuration plus the persistence backend.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ClinicStore>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn ClinicStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }

    /// Picks the backend named by `STORE_BACKEND`. A Supabase backend with
    /// missing credentials falls back to memory.
    pub fn from_config(config: AppConfig) -> Self {
        let store: Arc<dyn ClinicStore> = match config.store_backend {
            StoreBackend::Supabase if config.is_configured() => {
                info!("Using Supabase store at {}", config.supabase_url);
                Arc::new(SupabaseStore::new(&config))
            }
            StoreBackend::Supabase => {
                warn!("Supabase store is not configured, falling back to in-memory store");
                Arc::new(MemoryStore::new())
            }
            StoreBackend::Memory => {
                info!("Using in-memory store");
                Arc::new(MemoryStore::new())
            }
        };

        Self::new(config, store)
    }

    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(config, Arc::new(MemoryStore::new()))
    }
}
