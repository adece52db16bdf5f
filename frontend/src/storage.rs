use loto_dashboard::services::{DashboardError, KeyValueStore, ServiceResult};
use web_sys::Storage;

use crate::dom::describe;

/// `window.localStorage`. Every access re-resolves the store, which may be
/// missing or throwing in private browsing.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    fn storage(&self) -> ServiceResult<Storage> {
        web_sys::window()
            .ok_or_else(|| DashboardError::Storage("no window".into()))?
            .local_storage()
            .map_err(|err| DashboardError::Storage(describe(&err)))?
            .ok_or_else(|| DashboardError::Storage("localStorage unavailable".into()))
    }
}

impl KeyValueStore for LocalStorageStore {
    fn get_item(&self, key: &str) -> ServiceResult<Option<String>> {
        self.storage()?
            .get_item(key)
            .map_err(|err| DashboardError::Storage(describe(&err)))
    }

    fn set_item(&self, key: &str, value: &str) -> ServiceResult<()> {
        self.storage()?
            .set_item(key, value)
            .map_err(|err| DashboardError::Storage(describe(&err)))
    }
}
