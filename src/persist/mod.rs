//! Persistent bindings between observables and storage areas.
//!
//! A binding hydrates an observable from the JSON stored under a key, then
//! writes the JSON of every new value back to that key. [`attach`] binds an
//! existing observable for good; [`savable`] builds a [`Savable`] whose
//! binding can be mounted and dismounted explicitly.
//!
//! The stored text is exactly `serde_json::to_string(&value)`, with no
//! envelope or version tag.

mod attach;
mod savable;

pub use attach::{attach, attach_default, attach_to, DEFAULT_KEY};
pub use savable::{savable, savable_with, Savable, SavableBuilder, SavableOptions, WriteTarget};

use crate::error::Result;
use crate::storage::StorageArea;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Parse the snapshot stored under `key`. Missing and empty entries read as `None`.
fn read_snapshot<T, A>(area: &A, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    A: StorageArea + ?Sized,
{
    match area.get_item(key)? {
        Some(json) if !json.is_empty() => Ok(Some(serde_json::from_str(&json)?)),
        _ => Ok(None),
    }
}

fn write_snapshot<T, A>(area: &A, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    A: StorageArea + ?Sized,
{
    let json = serde_json::to_string(value)?;
    tracing::trace!(key, bytes = json.len(), "persisting snapshot");
    area.set_item(key, &json)?;
    Ok(())
}
