use super::StorageArea;
use crate::error::StorageError;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// An in-process storage area.
///
/// Clones share the same entries. With a quota, the summed byte length of all
/// keys and values may not exceed it; a write that would is rejected and
/// leaves the area untouched.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Area that holds at most `quota` bytes of keys and values.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: Arc::default(),
            quota: Some(quota),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Stored keys in ascending order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    fn used_without(entries: &BTreeMap<String, String>, key: &str) -> usize {
        entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl StorageArea for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        if let Some(quota) = self.quota {
            let needed = Self::used_without(&entries, key) + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let area = MemoryStorage::new();
        assert_eq!(area.get_item("k").unwrap(), None);

        area.set_item("k", "1").unwrap();
        area.set_item("k", "2").unwrap();
        assert_eq!(area.get_item("k").unwrap().as_deref(), Some("2"));
        assert_eq!(area.len(), 1);

        area.remove_item("k").unwrap();
        area.remove_item("k").unwrap();
        assert!(area.is_empty());
    }

    #[test]
    fn clones_share_entries() {
        let area = MemoryStorage::new();
        let other = area.clone();
        other.set_item("b", "x").unwrap();
        other.set_item("a", "y").unwrap();

        assert_eq!(area.keys(), vec!["a".to_string(), "b".to_string()]);
        area.clear();
        assert!(other.is_empty());
    }

    #[test]
    fn quota_rejects_oversized_write() {
        let area = MemoryStorage::with_quota(8);
        area.set_item("key", "12345").unwrap();

        // Overwriting the same key only counts the new value.
        area.set_item("key", "54321").unwrap();

        let err = area.set_item("key", "123456").unwrap_err();
        assert_eq!(
            err,
            StorageError::QuotaExceeded {
                key: "key".to_string(),
                needed: 9,
                quota: 8,
            }
        );
        assert_eq!(area.get_item("key").unwrap().as_deref(), Some("54321"));
    }
}
