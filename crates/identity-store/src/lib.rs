//! Identity storage for passwordless sign-in.
//!
//! Holds users, the provider accounts linked to them, browser sessions and
//! pending verification tokens. The backend (memory or JSON file) is picked
//! from a URL when the store is opened and never changes afterwards.

mod backend;
mod error;
mod shared;
mod store;
mod types;

pub use backend::{Backend, FileBackend};
pub use error::StoreError;
pub use shared::shared;
pub use store::IdentityStore;
pub use types::*;
