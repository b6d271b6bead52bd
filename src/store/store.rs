use super::Observable;
use crate::error::Result;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

type Subscriber<T> = Arc<dyn Fn(&T) -> Result<()> + Send + Sync>;

/// Cleanup returned by a [`StartStopNotifier`], run when the last subscriber leaves.
pub type StopNotifier = Box<dyn FnOnce() + Send + Sync>;

/// Called with the store when its first subscriber arrives.
pub type StartStopNotifier<T> = Arc<dyn Fn(&Store<T>) -> Option<StopNotifier> + Send + Sync>;

struct Inner<T> {
    state: RwLock<T>,
    subscribers: Mutex<Vec<(usize, Subscriber<T>)>>,
    next_id: AtomicUsize,
    start: Option<StartStopNotifier<T>>,
    stop: Mutex<Option<StopNotifier>>,
    // Deliveries waiting for the outermost notify to reach them
    queue: Mutex<VecDeque<(Subscriber<T>, Arc<T>)>>,
    draining: AtomicBool,
}

/// Clears the delivery queue when the draining notify returns or unwinds.
struct DrainGuard<'a, T> {
    inner: &'a Inner<T>,
}

impl<T> Drop for DrainGuard<'_, T> {
    fn drop(&mut self) {
        self.inner.queue.lock().clear();
        self.inner.draining.store(false, Ordering::SeqCst);
    }
}

impl<T> Inner<T> {
    fn remove_subscriber(&self, id: usize) {
        let stop = {
            let mut subscribers = self.subscribers.lock();
            let before = subscribers.len();
            subscribers.retain(|(sub_id, _)| *sub_id != id);
            if subscribers.len() < before && subscribers.is_empty() {
                self.stop.lock().take()
            } else {
                None
            }
        };

        if let Some(stop) = stop {
            stop();
        }
    }
}

/// An observable value container.
///
/// Subscribers are called synchronously: once with the current value when
/// they subscribe, then after every [`set`](Store::set) or
/// [`update`](Store::update). No store lock is held while a subscriber runs,
/// so subscribers may write to the store or cancel subscriptions.
///
/// Cloning a store yields another handle to the same value.
///
/// # Examples
///
/// ```
/// use savable::Store;
/// use std::sync::{Arc, Mutex};
///
/// let store = Store::new(1);
/// let seen = Arc::new(Mutex::new(Vec::new()));
///
/// let unsub = store.subscribe({
///     let seen = seen.clone();
///     move |value| seen.lock().unwrap().push(*value)
/// });
///
/// store.set(2).unwrap();
/// unsub.unsubscribe();
/// store.set(3).unwrap();
///
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
/// ```
pub struct Store<T> {
    inner: Arc<Inner<T>>,
}

impl<T: Clone + Send + Sync + 'static> Store<T> {
    /// Create a new store with the given initial state.
    pub fn new(initial: T) -> Self {
        Self::build(initial, None)
    }

    /// Create a store whose `start` notifier runs when the subscriber count
    /// goes from zero to one.
    ///
    /// The [`StopNotifier`] it returns, if any, runs when the count drops back
    /// to zero.
    pub fn with_notifier<F>(initial: T, start: F) -> Self
    where
        F: Fn(&Store<T>) -> Option<StopNotifier> + Send + Sync + 'static,
    {
        Self::build(initial, Some(Arc::new(start)))
    }

    pub(crate) fn build(initial: T, start: Option<StartStopNotifier<T>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(initial),
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicUsize::new(0),
                start,
                stop: Mutex::new(None),
                queue: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
            }),
        }
    }

    /// Get a clone of the current state.
    pub fn get(&self) -> T {
        self.inner.state.read().clone()
    }

    /// Update the state in place, then notify subscribers.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut T),
    {
        {
            let mut state = self.inner.state.write();
            f(&mut *state);
        }
        self.notify()
    }

    /// Set a new state value, then notify subscribers.
    ///
    /// Subscribers are notified on every call, even when the new value equals
    /// the old one, so a persisted store writes once per `set`.
    ///
    /// The first subscriber error stops notification and is returned. The
    /// new value is kept either way.
    pub fn set(&self, new_state: T) -> Result<()> {
        *self.inner.state.write() = new_state;
        self.notify()
    }

    /// Subscribe to state changes.
    ///
    /// The callback runs immediately with the current state and again after
    /// every change. Dropping the returned [`Unsubscriber`] leaves the
    /// subscription in place.
    pub fn subscribe<F>(&self, callback: F) -> Unsubscriber
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let subscriber: Subscriber<T> = Arc::new(move |state: &T| {
            callback(state);
            Ok(())
        });

        match self.add_subscriber(subscriber) {
            Ok(unsub) => unsub,
            // The wrapper above never fails.
            Err(_) => Unsubscriber::noop(),
        }
    }

    /// Subscribe with a callback that can fail.
    ///
    /// Errors from later notifications are returned by the `set` or `update`
    /// call that triggered them. If the immediate first call fails the
    /// subscription is removed again and the error returned here.
    pub fn try_subscribe<F>(&self, callback: F) -> Result<Unsubscriber>
    where
        F: Fn(&T) -> Result<()> + Send + Sync + 'static,
    {
        self.add_subscriber(Arc::new(callback))
    }

    /// Number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Read state without notifying anyone.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        let state = self.inner.state.read();
        f(&*state)
    }

    fn add_subscriber(&self, subscriber: Subscriber<T>) -> Result<Unsubscriber> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let first = {
            let mut subscribers = self.inner.subscribers.lock();
            subscribers.push((id, Arc::clone(&subscriber)));
            subscribers.len() == 1
        };

        if first {
            if let Some(start) = &self.inner.start {
                let stop = start(self);
                *self.inner.stop.lock() = stop;
            }
        }

        let state = self.get();
        if let Err(err) = subscriber(&state) {
            self.inner.remove_subscriber(id);
            return Err(err);
        }

        let inner = Arc::downgrade(&self.inner);
        Ok(Unsubscriber {
            cancel: Some(Box::new(move || {
                if let Some(inner) = inner.upgrade() {
                    inner.remove_subscriber(id);
                }
            })),
        })
    }

    /// Notify all subscribers of a state change.
    ///
    /// A `set` made by a subscriber queues its round behind the current one
    /// instead of interrupting it, so every subscriber sees the values in
    /// order and ends on the final one.
    fn notify(&self) -> Result<()> {
        let subscribers: Vec<Subscriber<T>> = self
            .inner
            .subscribers
            .lock()
            .iter()
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect();

        if subscribers.is_empty() {
            return Ok(());
        }

        let state = Arc::new(self.get());
        self.inner.queue.lock().extend(
            subscribers
                .into_iter()
                .map(|subscriber| (subscriber, Arc::clone(&state))),
        );

        if self.inner.draining.swap(true, Ordering::SeqCst) {
            // An outer notify further up the stack delivers this round.
            return Ok(());
        }

        let _guard = DrainGuard { inner: &self.inner };
        loop {
            let next = self.inner.queue.lock().pop_front();
            let Some((subscriber, state)) = next else {
                return Ok(());
            };
            subscriber(&state)?;
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> for Store<T> {
    fn get(&self) -> T {
        Store::get(self)
    }

    fn set(&self, value: T) -> Result<()> {
        Store::set(self, value)
    }

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut T),
    {
        Store::update(self, f)
    }

    fn subscribe<F>(&self, callback: F) -> Unsubscriber
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Store::subscribe(self, callback)
    }

    fn try_subscribe<F>(&self, callback: F) -> Result<Unsubscriber>
    where
        F: Fn(&T) -> Result<()> + Send + Sync + 'static,
    {
        Store::try_subscribe(self, callback)
    }
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &*self.inner.state.read())
            .field("subscribers", &self.inner.subscribers.lock().len())
            .finish()
    }
}

/// Handle that cancels one subscription.
///
/// Cancelling consumes the handle. Once the store itself is gone,
/// unsubscribing does nothing.
#[must_use = "dropping an Unsubscriber keeps the subscription alive"]
pub struct Unsubscriber {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Unsubscriber {
    fn noop() -> Self {
        Self { cancel: None }
    }

    /// Cancel the subscription.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Unsubscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscriber")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
