//! # Savable
//!
//! Observable stores that persist themselves to key-value storage as JSON.
//!
//! Savable has three layers:
//!
//! ## Stores
//!
//! - `Store<T>` - Observable value container with synchronous subscribers
//! - Optional start/stop notifier tied to the subscriber count
//!
//! ## Storage areas
//!
//! - `StorageArea` - `getItem`/`setItem`/`removeItem` over string keys
//! - `MemoryStorage` in process, `WebStorage` on `wasm32`
//! - A default area, scoped per thread with `storage::with_default_area`
//!
//! ## Persistent bindings
//!
//! - `attach` - Hydrate an existing store and persist it for good
//! - `Savable<T>` - A store with explicit `mount`/`dismount` of its binding
//!
//! ```
//! use savable::storage::{self, MemoryStorage, StorageArea};
//! use savable::savable;
//! use std::sync::Arc;
//!
//! let area = MemoryStorage::new();
//! storage::with_default_area(Arc::new(area.clone()), || {
//!     let theme = savable("theme", "light".to_string());
//!     theme.mount_default().unwrap();
//!     theme.set("dark".to_string()).unwrap();
//! });
//!
//! assert_eq!(area.get_item("theme").unwrap().as_deref(), Some("\"dark\""));
//! ```

pub mod error;
pub mod persist;
pub mod storage;
pub mod store;

// Re-export main types for convenience
pub use error::{Error, Result, StorageError};
pub use persist::{
    attach, attach_default, attach_to, savable, savable_with, Savable, SavableBuilder,
    SavableOptions, WriteTarget, DEFAULT_KEY,
};
pub use storage::{MemoryStorage, SharedStorage, StorageArea};
pub use store::{Observable, Store, Unsubscriber};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn it_works() {
        // Basic smoke test
        let area = MemoryStorage::new();
        let shared: SharedStorage = Arc::new(area.clone());

        let count = Savable::builder("count", 0)
            .write_target(WriteTarget::MountArea)
            .build();
        count.mount(&shared).unwrap();
        count.set(42).unwrap();
        assert_eq!(area.get_item("count").unwrap().as_deref(), Some("42"));
    }
}
