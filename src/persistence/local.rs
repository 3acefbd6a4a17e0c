//! Browser LocalStorage backend (WASM only)

use super::{KeyValueStore, StoreError};

pub struct LocalStore {
    storage: web_sys::Storage,
}

impl LocalStore {
    /// Grab `window.localStorage`
    pub fn open() -> Result<Self, StoreError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| StoreError::Unavailable("localStorage".to_string()))?;
        Ok(Self { storage })
    }
}

fn js_error(e: wasm_bindgen::JsValue) -> StoreError {
    StoreError::Unavailable(format!("{:?}", e))
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage.get_item(key).map_err(js_error)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage.set_item(key, value).map_err(js_error)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.storage.remove_item(key).map_err(js_error)
    }
}
