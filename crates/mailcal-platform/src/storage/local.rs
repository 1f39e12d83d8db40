//! `window.localStorage` backend.
//! Persistent across page reloads; synchronous string key-value API.

use wasm_bindgen::JsValue;
use web_sys::Storage;

use mailcal_core::ports::StoragePort;
use mailcal_types::{ClientError, Result};

pub struct LocalStorage {
    storage: Storage,
}

impl LocalStorage {
    /// Fails outside a browser window or when storage is disabled.
    pub fn open() -> Result<Self> {
        let window = web_sys::window()
            .ok_or_else(|| ClientError::Storage("No window object".to_string()))?;

        let storage = window
            .local_storage()
            .map_err(storage_error)?
            .ok_or_else(|| ClientError::Storage("localStorage not available".to_string()))?;

        Ok(Self { storage })
    }
}

fn storage_error(e: JsValue) -> ClientError {
    ClientError::Storage(format!("{:?}", e))
}

impl StoragePort for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage.get_item(key).map_err(storage_error)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.storage.set_item(key, value).map_err(storage_error)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.storage.remove_item(key).map_err(storage_error)
    }

    fn backend_name(&self) -> &str {
        "localStorage"
    }
}
