//! Named bucket bound to the store that holds it.

use std::fmt;
use std::sync::Arc;

use reconcile_store::StorageClient;

/// A bucket name together with the client used to reach it.
///
/// Created once per bucket per run and never mutated; cloning shares the
/// underlying client.
#[derive(Clone)]
pub struct BucketHandle {
    name: String,
    client: Arc<dyn StorageClient>,
}

impl BucketHandle {
    /// Bind `name` to `client`.
    pub fn new(name: impl Into<String>, client: Arc<dyn StorageClient>) -> Self {
        Self {
            name: name.into(),
            client,
        }
    }

    /// The bucket name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The store holding the bucket.
    #[must_use]
    pub fn client(&self) -> &dyn StorageClient {
        self.client.as_ref()
    }
}

impl fmt::Debug for BucketHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
