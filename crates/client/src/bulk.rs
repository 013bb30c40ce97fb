//! Sequential bulk delete.

use std::future::Future;

use crate::error::ClientError;

/// Outcome of deleting several items one at a time.
#[derive(Debug)]
pub struct BulkDeleteReport<K> {
    /// Keys whose delete call succeeded, in call order.
    pub deleted: Vec<K>,
    /// Keys whose delete call failed, with the error.
    pub failed: Vec<(K, ClientError)>,
}

impl<K> BulkDeleteReport<K> {
    /// Number of successful delete calls.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.deleted.len()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Call `delete` for each key in order, awaiting each call before the next.
///
/// A failure is recorded and the remaining keys are still attempted.
pub async fn delete_each<K, I, F, Fut>(keys: I, mut delete: F) -> BulkDeleteReport<K>
where
    K: Clone + std::fmt::Display,
    I: IntoIterator<Item = K>,
    F: FnMut(K) -> Fut,
    Fut: Future<Output = Result<(), ClientError>>,
{
    let mut report = BulkDeleteReport {
        deleted: Vec::new(),
        failed: Vec::new(),
    };

    for key in keys {
        match delete(key.clone()).await {
            Ok(()) => report.deleted.push(key),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Delete failed");
                report.failed.push((key, e));
            }
        }
    }

    tracing::info!(
        deleted = report.deleted.len(),
        failed = report.failed.len(),
        "Bulk delete finished"
    );
    report
}
