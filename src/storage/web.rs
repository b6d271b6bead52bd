use super::StorageArea;
use crate::error::StorageError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Local,
    Session,
}

/// Browser Web Storage (`localStorage` or `sessionStorage`).
///
/// The `Storage` object is looked up on every call, so the handle itself is
/// `Send + Sync` and stays valid if the page's storage is swapped out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WebStorage {
    kind: Kind,
}

impl WebStorage {
    /// `window.localStorage`.
    pub fn local() -> Self {
        Self { kind: Kind::Local }
    }

    /// `window.sessionStorage`.
    pub fn session() -> Self {
        Self {
            kind: Kind::Session,
        }
    }

    fn storage(&self) -> Result<web_sys::Storage, StorageError> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no global window".to_string()))?;

        let storage = match self.kind {
            Kind::Local => window.local_storage(),
            Kind::Session => window.session_storage(),
        };

        storage
            .map_err(|e| StorageError::Js(format!("{e:?}")))?
            .ok_or_else(|| StorageError::Unavailable(format!("{:?} storage is disabled", self.kind)))
    }
}

impl StorageArea for WebStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage()?
            .get_item(key)
            .map_err(|e| StorageError::Js(format!("{e:?}")))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Js(format!("{e:?}")))
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.storage()?
            .remove_item(key)
            .map_err(|e| StorageError::Js(format!("{e:?}")))
    }
}
