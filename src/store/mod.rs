//! Observable value containers.
//!
//! A [`Store`] holds one value and notifies its subscribers synchronously on
//! every change. [`Observable`] is the capability set persistent bindings rely
//! on; both [`Store`] and [`Savable`](crate::Savable) implement it.

mod store;

pub use store::{StartStopNotifier, StopNotifier, Store, Unsubscriber};

use crate::error::Result;

/// A value holder with `set`/`update`/`subscribe` semantics.
pub trait Observable<T> {
    /// Clone of the current value.
    fn get(&self) -> T;

    /// Replace the value and notify subscribers.
    fn set(&self, value: T) -> Result<()>;

    /// Mutate the value in place and notify subscribers.
    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut T);

    /// Register an infallible subscriber, called immediately and on every change.
    fn subscribe<F>(&self, callback: F) -> Unsubscriber
    where
        F: Fn(&T) + Send + Sync + 'static;

    /// Register a fallible subscriber, called immediately and on every change.
    fn try_subscribe<F>(&self, callback: F) -> Result<Unsubscriber>
    where
        F: Fn(&T) -> Result<()> + Send + Sync + 'static;
}
