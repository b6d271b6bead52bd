//! Integration tests for Savable

use savable::storage::{self, MemoryStorage, SharedStorage, StorageArea};
use savable::{attach, attach_to, savable, savable_with, Error, Savable, Store, WriteTarget};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Settings {
    volume: f32,
    theme: String,
}

fn settings() -> Settings {
    Settings {
        volume: 1.0,
        theme: "light".to_string(),
    }
}

#[test]
fn attach_integration() {
    let area = MemoryStorage::new();
    area.set_item("settings", r#"{"volume":0.5,"theme":"dark"}"#).unwrap();

    storage::with_default_area(Arc::new(area.clone()), || {
        let store = Store::new(settings());
        attach(&store, "settings").unwrap();

        // Test hydration
        assert_eq!(store.get().theme, "dark");
        assert_eq!(store.get().volume, 0.5);

        // Test persistence of updates
        store.update(|s| s.volume = 0.25).unwrap();
    });

    let stored: Settings =
        serde_json::from_str(&area.get_item("settings").unwrap().unwrap()).unwrap();
    assert_eq!(stored.volume, 0.25);
    assert_eq!(stored.theme, "dark");
}

#[test]
fn attach_to_savable() {
    let area = MemoryStorage::new();
    let shared: SharedStorage = Arc::new(area.clone());

    // Any observable can be attached, a Savable included.
    let value = savable("other", 1);
    attach_to(&value, "mirror", shared).unwrap();
    value.set(2).unwrap();

    assert_eq!(area.get_item("mirror").unwrap().as_deref(), Some("2"));
}

#[test]
fn savable_lifecycle() {
    let area = MemoryStorage::new();
    let shared: SharedStorage = Arc::new(area.clone());

    storage::with_default_area(shared.clone(), || {
        let store = savable("settings", settings());

        assert!(matches!(store.dismount(&shared), Err(Error::NotMounted)));
        assert!(matches!(store.unsub(), Err(Error::NotSubscribed)));

        store.mount(&shared).unwrap();
        assert!(matches!(store.mount(&shared), Err(Error::AlreadyMounted)));

        store.update(|s| s.theme = "dark".to_string()).unwrap();

        let last = store.dismount(&shared).unwrap();
        assert_eq!(last, json!({"volume": 1.0, "theme": "dark"}));
        assert!(area.is_empty());
    });
}

#[test]
fn savable_hydrates_existing_entry() {
    let area = MemoryStorage::new();
    area.set_item("count", "7").unwrap();
    let shared: SharedStorage = Arc::new(area.clone());

    let count = Savable::builder("count", 0)
        .write_target(WriteTarget::MountArea)
        .build();

    let seen = Arc::new(AtomicUsize::new(0));
    let _unsub = count.subscribe({
        let seen = seen.clone();
        move |value| {
            seen.store(*value as usize, Ordering::SeqCst);
        }
    });

    count.mount(&shared).unwrap();
    assert_eq!(count.get(), 7);
    assert_eq!(seen.load(Ordering::SeqCst), 7);
}

#[test]
fn savable_with_notifier() {
    let area = MemoryStorage::new();
    let shared: SharedStorage = Arc::new(area.clone());
    let starts = Arc::new(AtomicUsize::new(0));

    storage::with_default_area(shared.clone(), || {
        let clock = savable_with("clock", 0u64, {
            let starts = starts.clone();
            move |store: &Store<u64>| {
                starts.fetch_add(1, Ordering::SeqCst);
                store.set(100).unwrap();
                None
            }
        });

        clock.mount(&shared).unwrap();
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(area.get_item("clock").unwrap().as_deref(), Some("100"));
    });
}

#[test]
fn bindings_sharing_a_key_last_write_wins() {
    let area = MemoryStorage::new();
    let shared: SharedStorage = Arc::new(area.clone());

    let a = Savable::builder("shared", 0)
        .write_target(WriteTarget::MountArea)
        .build();
    let b = Savable::builder("shared", 0)
        .write_target(WriteTarget::MountArea)
        .build();

    a.mount(&shared).unwrap();
    b.mount(&shared).unwrap();

    a.set(1).unwrap();
    b.set(2).unwrap();
    assert_eq!(area.get_item("shared").unwrap().as_deref(), Some("2"));
}

#[test]
fn attached_store_persists_value_set_by_subscriber() {
    let area = MemoryStorage::new();
    let shared: SharedStorage = Arc::new(area.clone());

    let store = Store::new(settings());
    let _mute = store.subscribe({
        let store = store.clone();
        move |s: &Settings| {
            if s.theme == "silent" && s.volume != 0.0 {
                store.update(|s| s.volume = 0.0).unwrap();
            }
        }
    });
    attach_to(&store, "settings", shared).unwrap();

    store.update(|s| s.theme = "silent".to_string()).unwrap();

    let stored: Settings =
        serde_json::from_str(&area.get_item("settings").unwrap().unwrap()).unwrap();
    assert_eq!(stored, store.get());
    assert_eq!(stored.volume, 0.0);
}
