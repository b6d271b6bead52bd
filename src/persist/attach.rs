use super::{read_snapshot, write_snapshot};
use crate::error::Result;
use crate::storage::{self, SharedStorage};
use crate::store::Observable;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Key used by [`attach_default`].
pub const DEFAULT_KEY: &str = "store";

/// Bind `store` to `key` in the default storage area for the rest of its life.
///
/// If the area holds a non-empty entry at `key`, it is parsed and set as the
/// store's value. The store is then subscribed so that every value, starting
/// with the current one, is written back as JSON. There is no way to detach.
///
/// # Examples
///
/// ```
/// use savable::storage::{self, MemoryStorage, StorageArea};
/// use savable::{attach, Store};
/// use std::sync::Arc;
///
/// let area = MemoryStorage::new();
/// area.set_item("count", "41").unwrap();
///
/// storage::with_default_area(Arc::new(area.clone()), || {
///     let count = Store::new(0);
///     attach(&count, "count").unwrap();
///     assert_eq!(count.get(), 41);
///
///     count.update(|n| *n += 1).unwrap();
/// });
///
/// assert_eq!(area.get_item("count").unwrap().as_deref(), Some("42"));
/// ```
pub fn attach<T, O>(store: &O, key: &str) -> Result<()>
where
    O: Observable<T>,
    T: Serialize + DeserializeOwned + 'static,
{
    attach_to(store, key, storage::default_area())
}

/// [`attach`] under [`DEFAULT_KEY`].
pub fn attach_default<T, O>(store: &O) -> Result<()>
where
    O: Observable<T>,
    T: Serialize + DeserializeOwned + 'static,
{
    attach(store, DEFAULT_KEY)
}

/// [`attach`] against an explicit storage area.
pub fn attach_to<T, O>(store: &O, key: &str, area: SharedStorage) -> Result<()>
where
    O: Observable<T>,
    T: Serialize + DeserializeOwned + 'static,
{
    if let Some(value) = read_snapshot(&area, key)? {
        tracing::debug!(key, "hydrating attached store");
        store.set(value)?;
    }

    let key = key.to_string();
    let _ = store.try_subscribe(move |value: &T| write_snapshot(&area, &key, value))?;
    Ok(())
}
