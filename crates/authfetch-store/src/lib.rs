//! authfetch-store - Credential store implementations.
//!
//! Both stores also implement [`SessionTeardown`](authfetch_core::SessionTeardown)
//! by clearing every credential they hold.

mod file;
mod memory;

pub use file::{FileCredentialStore, StoredEntry};
pub use memory::MemoryCredentialStore;
