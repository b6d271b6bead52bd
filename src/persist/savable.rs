use super::{read_snapshot, write_snapshot};
use crate::error::{Error, Result};
use crate::storage::{self, SharedStorage};
use crate::store::{Observable, StartStopNotifier, StopNotifier, Store, Unsubscriber};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Where a mounted [`Savable`] writes its snapshots.
#[derive(Clone, Default)]
pub enum WriteTarget {
    /// The default storage area current at mount time, whatever area was
    /// passed to `mount`.
    #[default]
    DefaultArea,
    /// The area passed to `mount`.
    MountArea,
    /// A fixed area.
    Area(SharedStorage),
}

impl WriteTarget {
    fn resolve(&self, mount_area: &SharedStorage) -> SharedStorage {
        match self {
            WriteTarget::DefaultArea => storage::default_area(),
            WriteTarget::MountArea => Arc::clone(mount_area),
            WriteTarget::Area(area) => Arc::clone(area),
        }
    }
}

impl fmt::Debug for WriteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteTarget::DefaultArea => f.write_str("DefaultArea"),
            WriteTarget::MountArea => f.write_str("MountArea"),
            WriteTarget::Area(_) => f.write_str("Area(..)"),
        }
    }
}

/// Configuration for a [`Savable`].
#[derive(Clone, Debug, Default)]
pub struct SavableOptions {
    pub write_target: WriteTarget,
}

#[derive(Default)]
struct Binding {
    mounted: bool,
    unsub: Option<Unsubscriber>,
}

/// A store with a mountable binding to a storage key.
///
/// Starts unmounted. [`mount`](Savable::mount) hydrates the store from the
/// area and starts persisting every change; [`dismount`](Savable::dismount)
/// stops persisting, deletes the entry and hands back its last JSON value.
/// Calls out of order fail with [`Error::AlreadyMounted`],
/// [`Error::NotMounted`] or [`Error::NotSubscribed`].
///
/// Clones share the store and the binding.
///
/// # Examples
///
/// ```
/// use savable::storage::{MemoryStorage, SharedStorage, StorageArea};
/// use savable::{Savable, WriteTarget};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let area = MemoryStorage::new();
/// let shared: SharedStorage = Arc::new(area.clone());
///
/// let todos = Savable::builder("todos", Vec::<String>::new())
///     .write_target(WriteTarget::MountArea)
///     .build();
///
/// todos.mount(&shared).unwrap();
/// todos.update(|list| list.push("write docs".to_string())).unwrap();
/// assert_eq!(area.get_item("todos").unwrap().as_deref(), Some(r#"["write docs"]"#));
///
/// let last = todos.dismount(&shared).unwrap();
/// assert_eq!(last, json!(["write docs"]));
/// assert!(area.get_item("todos").unwrap().is_none());
/// ```
pub struct Savable<T> {
    store: Store<T>,
    key: Arc<str>,
    options: SavableOptions,
    binding: Arc<Mutex<Binding>>,
}

/// Create an unmounted [`Savable`] for `key`.
pub fn savable<T>(key: impl Into<String>, value: T) -> Savable<T>
where
    T: Clone + Send + Sync + 'static,
{
    Savable::builder(key, value).build()
}

/// [`savable`] with a start/stop notifier for the underlying store.
pub fn savable_with<T, F>(key: impl Into<String>, value: T, start: F) -> Savable<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(&Store<T>) -> Option<StopNotifier> + Send + Sync + 'static,
{
    Savable::builder(key, value).notifier(start).build()
}

impl<T: Clone + Send + Sync + 'static> Savable<T> {
    pub fn builder(key: impl Into<String>, value: T) -> SavableBuilder<T> {
        SavableBuilder {
            key: key.into(),
            value,
            start: None,
            options: SavableOptions::default(),
        }
    }

    /// The storage key this binding uses.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_mounted(&self) -> bool {
        self.binding.lock().mounted
    }

    /// The underlying store.
    pub fn store(&self) -> &Store<T> {
        &self.store
    }

    pub fn get(&self) -> T {
        self.store.get()
    }

    pub fn set(&self, value: T) -> Result<()> {
        self.store.set(value)
    }

    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut T),
    {
        self.store.update(f)
    }

    pub fn subscribe<F>(&self, callback: F) -> Unsubscriber
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.store.subscribe(callback)
    }

    pub fn try_subscribe<F>(&self, callback: F) -> Result<Unsubscriber>
    where
        F: Fn(&T) -> Result<()> + Send + Sync + 'static,
    {
        self.store.try_subscribe(callback)
    }

    /// Cancel the storage subscription without deleting the stored entry.
    ///
    /// Leaves the binding unmounted. Fails with [`Error::NotSubscribed`] and
    /// changes nothing if there is no subscription.
    pub fn unsub(&self) -> Result<()> {
        let unsub = {
            let mut binding = self.binding.lock();
            let unsub = binding.unsub.take().ok_or(Error::NotSubscribed)?;
            binding.mounted = false;
            unsub
        };

        unsub.unsubscribe();
        tracing::debug!(key = %self.key, "storage subscription cancelled");
        Ok(())
    }
}

impl<T> Savable<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Hydrate from `area`, then persist every change.
    ///
    /// The binding counts as mounted as soon as the check passes: if reading
    /// or parsing the stored entry fails, it stays mounted without a
    /// subscription, and only [`dismount`](Savable::dismount) reports that.
    pub fn mount(&self, area: &SharedStorage) -> Result<()> {
        {
            let mut binding = self.binding.lock();
            if binding.mounted {
                return Err(Error::AlreadyMounted);
            }
            binding.mounted = true;
        }

        if let Some(value) = read_snapshot(area, &self.key)? {
            tracing::debug!(key = %self.key, "hydrating savable");
            self.store.set(value)?;
        }

        let target = self.options.write_target.resolve(area);
        let key = Arc::clone(&self.key);
        let unsub = self
            .store
            .try_subscribe(move |value: &T| write_snapshot(&target, &key, value))?;
        self.binding.lock().unsub = Some(unsub);

        tracing::debug!(key = %self.key, "mounted");
        Ok(())
    }

    /// [`mount`](Savable::mount) against the default storage area.
    pub fn mount_default(&self) -> Result<()> {
        self.mount(&storage::default_area())
    }

    /// Stop persisting and delete the entry from `area`.
    ///
    /// Returns the entry's JSON as it was before removal; a missing or empty
    /// entry reads as `{}`.
    pub fn dismount(&self, area: &SharedStorage) -> Result<serde_json::Value> {
        if !self.binding.lock().mounted {
            return Err(Error::NotMounted);
        }

        let stored = area.get_item(&self.key)?;
        let snapshot: serde_json::Value = serde_json::from_str(
            stored
                .as_deref()
                .filter(|json| !json.is_empty())
                .unwrap_or("{}"),
        )?;

        let unsub = {
            let mut binding = self.binding.lock();
            let unsub = binding.unsub.take().ok_or(Error::NotSubscribed)?;
            binding.mounted = false;
            unsub
        };
        unsub.unsubscribe();
        area.remove_item(&self.key)?;

        tracing::debug!(key = %self.key, "dismounted");
        Ok(snapshot)
    }

    /// [`dismount`](Savable::dismount) against the default storage area.
    pub fn dismount_default(&self) -> Result<serde_json::Value> {
        self.dismount(&storage::default_area())
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> for Savable<T> {
    fn get(&self) -> T {
        Savable::get(self)
    }

    fn set(&self, value: T) -> Result<()> {
        Savable::set(self, value)
    }

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut T),
    {
        Savable::update(self, f)
    }

    fn subscribe<F>(&self, callback: F) -> Unsubscriber
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Savable::subscribe(self, callback)
    }

    fn try_subscribe<F>(&self, callback: F) -> Result<Unsubscriber>
    where
        F: Fn(&T) -> Result<()> + Send + Sync + 'static,
    {
        Savable::try_subscribe(self, callback)
    }
}

impl<T> Clone for Savable<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key: Arc::clone(&self.key),
            options: self.options.clone(),
            binding: Arc::clone(&self.binding),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Savable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Savable")
            .field("key", &self.key)
            .field("mounted", &self.binding.lock().mounted)
            .field("options", &self.options)
            .field("store", &self.store)
            .finish()
    }
}

/// Builder for [`Savable`].
pub struct SavableBuilder<T> {
    key: String,
    value: T,
    start: Option<StartStopNotifier<T>>,
    options: SavableOptions,
}

impl<T: Clone + Send + Sync + 'static> SavableBuilder<T> {
    /// Start/stop notifier for the underlying store.
    pub fn notifier<F>(mut self, start: F) -> Self
    where
        F: Fn(&Store<T>) -> Option<StopNotifier> + Send + Sync + 'static,
    {
        self.start = Some(Arc::new(start));
        self
    }

    pub fn write_target(mut self, target: WriteTarget) -> Self {
        self.options.write_target = target;
        self
    }

    pub fn options(mut self, options: SavableOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Savable<T> {
        Savable {
            store: Store::build(self.value, self.start),
            key: Arc::from(self.key),
            options: self.options,
            binding: Arc::new(Mutex::new(Binding::default())),
        }
    }
}
