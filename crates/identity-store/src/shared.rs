//! Process-wide store handle.

use crate::error::StoreError;
use crate::store::IdentityStore;
use tokio::sync::OnceCell;
use tracing::debug;

static SHARED: OnceCell<IdentityStore> = OnceCell::const_new();

/// Get the process-wide store, opening it from `url` on first use.
///
/// The backend is fixed by the first successful call; `url` is ignored
/// afterwards.
pub async fn shared(url: &str) -> Result<&'static IdentityStore, StoreError> {
    if let Some(store) = SHARED.get() {
        debug!("Reusing shared identity store");
        return Ok(store);
    }
    SHARED.get_or_try_init(|| IdentityStore::open(url)).await
}
