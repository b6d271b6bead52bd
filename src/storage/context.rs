use super::SharedStorage;
use std::cell::RefCell;
use std::sync::{Arc, OnceLock};

// Thread-local stack of scoped default areas
thread_local! {
    static AREA_STACK: RefCell<Vec<SharedStorage>> = const { RefCell::new(Vec::new()) };
}

/// The process-wide storage area.
///
/// On `wasm32` this is the browser's `localStorage`; elsewhere it is a
/// [`MemoryStorage`](super::MemoryStorage) shared by the whole process.
pub fn global() -> SharedStorage {
    static GLOBAL: OnceLock<SharedStorage> = OnceLock::new();
    Arc::clone(GLOBAL.get_or_init(global_area))
}

#[cfg(target_arch = "wasm32")]
fn global_area() -> SharedStorage {
    Arc::new(super::WebStorage::local())
}

#[cfg(not(target_arch = "wasm32"))]
fn global_area() -> SharedStorage {
    Arc::new(super::MemoryStorage::new())
}

/// The current default storage area (scoped or global fallback).
///
/// Returns the innermost area installed with [`with_default_area`] on this
/// thread, or [`global`] if none is active.
pub fn default_area() -> SharedStorage {
    AREA_STACK
        .with(|stack| stack.borrow().last().cloned())
        .unwrap_or_else(global)
}

/// Run a function with `area` as this thread's default storage area.
///
/// The previous default is restored when `f` returns or panics.
///
/// # Examples
///
/// ```
/// use savable::storage::{self, MemoryStorage, StorageArea};
/// use std::sync::Arc;
///
/// let area = MemoryStorage::new();
/// storage::with_default_area(Arc::new(area.clone()), || {
///     storage::default_area().set_item("k", "1").unwrap();
/// });
///
/// assert_eq!(area.get_item("k").unwrap().as_deref(), Some("1"));
/// ```
pub fn with_default_area<F, R>(area: SharedStorage, f: F) -> R
where
    F: FnOnce() -> R,
{
    AREA_STACK.with(|stack| {
        stack.borrow_mut().push(area);
    });

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

    AREA_STACK.with(|stack| {
        stack.borrow_mut().pop();
    });

    match result {
        Ok(r) => r,
        Err(e) => std::panic::resume_unwind(e),
    }
}
