//! Registration entry point

use std::sync::OnceLock;

use crate::storage::StoreConfig;

use super::kv::KvTableAm;
use super::TableAccessMethod;

static HANDLER: OnceLock<KvTableAm> = OnceLock::new();

/// Return the process-wide access method instance
///
/// The first call opens the store configured through the `KVAM_*` environment
/// variables and initializes its catalog. The host cannot run without a store,
/// so failing to open it aborts the process.
pub fn kv_tableam_handler() -> &'static dyn TableAccessMethod {
    HANDLER.get_or_init(|| {
        let config = match StoreConfig::from_env() {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "invalid store configuration");
                std::process::abort();
            }
        };

        match KvTableAm::open(&config) {
            Ok(am) => {
                tracing::info!(backend = %config.backend, dir = %config.dir.display(), "kv table access method loaded");
                am
            }
            Err(e) => {
                tracing::error!(backend = %config.backend, dir = %config.dir.display(), error = %e, "failed to open store");
                std::process::abort();
            }
        }
    })
}
