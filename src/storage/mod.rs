//! Key-value storage areas.
//!
//! A [`StorageArea`] maps string keys to string values, following the Web
//! Storage `getItem`/`setItem`/`removeItem` contract. [`MemoryStorage`] keeps
//! entries in process memory; on `wasm32` [`WebStorage`] talks to the
//! browser's `localStorage` or `sessionStorage`.
//!
//! The default storage area is used whenever no explicit area is given. See
//! [`default_area`] and [`with_default_area`].

mod context;
mod memory;
#[cfg(target_arch = "wasm32")]
mod web;

pub use context::{default_area, global, with_default_area};
pub use memory::MemoryStorage;
#[cfg(target_arch = "wasm32")]
pub use web::WebStorage;

use crate::error::StorageError;
use std::sync::Arc;

/// A string-keyed, string-valued storage area.
pub trait StorageArea: Send + Sync {
    /// Value stored at `key`, or `None` if there is no entry.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Create or overwrite the entry at `key`.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the entry at `key`. Removing a missing key succeeds.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Shared handle to a storage area.
pub type SharedStorage = Arc<dyn StorageArea>;

impl<S: StorageArea + ?Sized> StorageArea for Arc<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }
}
