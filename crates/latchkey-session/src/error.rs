//! Error types for the session layer.

/// The boxed backend error carried inside a [`StoreError`].
///
/// The session layer is agnostic to the storage engine, so it can't name
/// the engine's error type — it carries whatever the store implementation
/// hands it.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// A failure reported by the backing session store.
///
/// Read and write failures stay distinguishable so callers can tell
/// "couldn't check" from "couldn't persist". Inside
/// [`SessionLifecycle::validate`](crate::SessionLifecycle::validate) these
/// are swallowed on the documented fail-closed paths; everywhere else they
/// propagate.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A lookup against the store failed.
    #[error("session store read failed: {0}")]
    Read(#[source] BackendError),

    /// A put, update, or delete against the store failed.
    #[error("session store write failed: {0}")]
    Write(#[source] BackendError),
}

impl StoreError {
    /// Wraps a backend error as a read failure.
    pub fn read(err: impl Into<BackendError>) -> Self {
        Self::Read(err.into())
    }

    /// Wraps a backend error as a write failure.
    pub fn write(err: impl Into<BackendError>) -> Self {
        Self::Write(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display_includes_backend_message() {
        let err = StoreError::read("connection refused");
        assert_eq!(
            err.to_string(),
            "session store read failed: connection refused"
        );

        let err = StoreError::write("disk full");
        assert_eq!(err.to_string(), "session store write failed: disk full");
    }
}
