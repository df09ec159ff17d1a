//! Storage error types.
//!
//! [`StoreError::NotFound`] is an expected negative answer for existence
//! checks; every other variant is a failure of the store or the transport.

/// Error returned by a [`StorageClient`](crate::StorageClient) operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The object does not exist.
    #[error("object not found: {bucket}/{key}")]
    NotFound {
        /// Bucket that was queried.
        bucket: String,
        /// Key that was not found.
        key: String,
    },

    /// The bucket does not exist.
    #[error("no such bucket: {bucket}")]
    NoSuchBucket {
        /// The missing bucket.
        bucket: String,
    },

    /// A request failed (network, permissions, throttling, server error).
    #[error("{operation} failed: {message}")]
    Request {
        /// The store operation, e.g. `ListObjectsV2`.
        operation: &'static str,
        /// Rendered error context.
        message: String,
    },

    /// A continuation token could not be decoded.
    #[error("invalid continuation token: {token}")]
    InvalidToken {
        /// The rejected token.
        token: String,
    },

    /// Reading an object body failed midway.
    #[error("body stream failed for {key}: {message}")]
    Body {
        /// Key whose body was being read.
        key: String,
        /// Rendered error.
        message: String,
    },
}

impl StoreError {
    /// Whether this error means "the object is not there".
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Build a [`StoreError::Request`].
    pub fn request(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Request {
            operation,
            message: message.into(),
        }
    }
}

/// Convenience result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_classify_not_found() {
        let err = StoreError::NotFound {
            bucket: "b".to_owned(),
            key: "k".to_owned(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "object not found: b/k");
    }

    #[test]
    fn test_should_not_classify_request_failure_as_not_found() {
        let err = StoreError::request("HeadObject", "AccessDenied");
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "HeadObject failed: AccessDenied");
    }
}
