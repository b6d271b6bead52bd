//! Error types for stores, storage areas and persistent bindings.

/// Failure reported by a [`StorageArea`](crate::storage::StorageArea).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The write would push the area over its byte quota.
    #[error("storage quota exceeded writing {key:?}: {needed} bytes needed, quota is {quota}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },

    /// The storage area could not be reached (no window, storage disabled).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The host threw while accessing the area.
    #[error("storage access failed: {0}")]
    Js(String),
}

/// Crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Already mounted")]
    AlreadyMounted,

    #[error("Not mounted")]
    NotMounted,

    #[error("Cannot unsubscribe when not subscribed")]
    NotSubscribed,

    /// Stored text is not valid JSON for the target type, or the value could
    /// not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl Error {
    /// Whether the error comes from calling lifecycle operations out of order.
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            Error::AlreadyMounted | Error::NotMounted | Error::NotSubscribed
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn misuse_messages_are_fixed() {
        assert_eq!(Error::AlreadyMounted.to_string(), "Already mounted");
        assert_eq!(Error::NotMounted.to_string(), "Not mounted");
        assert_eq!(
            Error::NotSubscribed.to_string(),
            "Cannot unsubscribe when not subscribed"
        );
    }

    #[test]
    fn is_misuse() {
        assert!(Error::AlreadyMounted.is_misuse());
        assert!(Error::NotSubscribed.is_misuse());

        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        assert!(!Error::from(json_err).is_misuse());
    }

    #[test]
    fn storage_error_is_transparent() {
        let err = Error::from(StorageError::QuotaExceeded {
            key: "todos".to_string(),
            needed: 12,
            quota: 8,
        });
        assert!(matches!(err, Error::Storage(StorageError::QuotaExceeded { .. })));
        assert!(err.to_string().contains("quota exceeded"));
        assert!(err.to_string().contains("\"todos\""));
    }
}
