pub mod error;
pub mod memory;
pub mod state;
pub mod store;
pub mod supabase;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use state::AppState;
pub use store::ClinicStore;
pub use supabase::{SupabaseClient, SupabaseStore};
