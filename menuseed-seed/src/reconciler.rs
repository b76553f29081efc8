//! Clear phase: remove stale documents and files ahead of a fresh seed.
//!
//! Collections are cleared in reverse dependency order (links, menu items,
//! customizations, categories), then the bucket. Listing is paginated with
//! a cursor and completes before the first delete, so deletions never
//! invalidate the cursor being followed.

use std::thread;
use std::time::Duration;

use menuseed_core::{BucketId, CollectionId, RecordId};
use menuseed_store::{Document, DocumentStore, Query, StoreError};

use crate::report::{BucketClear, ClearReport, CollectionClear};
use crate::verifier::Target;

/// How hard the clear phase leans on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearPacing {
    pub page_size: u32,
    pub delete_delay: Duration,
    pub delete_batch_size: usize,
}

pub struct Reconciler<'a> {
    target: Target<'a>,
    pacing: ClearPacing,
}

impl<'a> Reconciler<'a> {
    pub fn new(target: Target<'a>, pacing: ClearPacing) -> Self {
        Self { target, pacing }
    }

    /// Clear every collection and the bucket.
    ///
    /// A collection that cannot be listed is recorded and skipped; the phase
    /// moves on to the next resource.
    pub fn clear(&self) -> ClearReport {
        let mut report = ClearReport::default();
        let mut order = self.target.collections.in_dependency_order();
        order.reverse();
        for collection in order {
            report.collections.push(self.clear_collection(collection));
        }
        report.bucket = Some(self.clear_bucket(self.target.bucket));
        tracing::info!(
            "clear phase: {} deleted, {} failed",
            report.deleted(),
            report.failed()
        );
        report
    }

    fn clear_collection(&self, collection: &CollectionId) -> CollectionClear {
        let mut outcome = CollectionClear {
            collection: collection.clone(),
            deleted: 0,
            failed: 0,
            list_error: None,
        };
        let stale = match list_all_documents(self.target.documents, collection, self.page_size()) {
            Ok(docs) => docs,
            Err(e) => {
                tracing::warn!("cannot list {collection}: {e}");
                outcome.list_error = Some(e.to_string());
                return outcome;
            }
        };

        for (i, id) in stale.iter().map(|d| &d.id).enumerate() {
            if i > 0 && !self.pacing.delete_delay.is_zero() {
                thread::sleep(self.pacing.delete_delay);
            }
            match self.target.documents.delete_document(collection, id) {
                Ok(()) => outcome.deleted += 1,
                Err(e) => {
                    tracing::warn!("failed to delete {collection}/{id}: {e}");
                    outcome.failed += 1;
                }
            }
        }
        tracing::debug!(
            "{collection}: {} deleted, {} failed",
            outcome.deleted,
            outcome.failed
        );
        outcome
    }

    fn clear_bucket(&self, bucket: &BucketId) -> BucketClear {
        let mut outcome = BucketClear {
            bucket: bucket.clone(),
            deleted: 0,
            failed: 0,
            list_error: None,
        };
        let ids = match self.file_ids(bucket) {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!("cannot list {bucket}: {e}");
                outcome.list_error = Some(e.to_string());
                return outcome;
            }
        };

        let objects = self.target.objects;
        for (i, batch) in ids.chunks(self.pacing.delete_batch_size.max(1)).enumerate() {
            if i > 0 && !self.pacing.delete_delay.is_zero() {
                thread::sleep(self.pacing.delete_delay);
            }
            let results: Vec<bool> = thread::scope(|s| {
                let handles: Vec<_> = batch
                    .iter()
                    .map(|id| {
                        s.spawn(move || match objects.delete_file(bucket, id) {
                            Ok(()) => true,
                            Err(e) => {
                                tracing::warn!("failed to delete file {bucket}/{id}: {e}");
                                false
                            }
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|h| h.join().unwrap_or(false))
                    .collect()
            });
            let ok = results.iter().filter(|r| **r).count();
            outcome.deleted += ok;
            outcome.failed += results.len() - ok;
        }
        tracing::debug!(
            "{bucket}: {} files deleted, {} failed",
            outcome.deleted,
            outcome.failed
        );
        outcome
    }

    fn file_ids(&self, bucket: &BucketId) -> Result<Vec<RecordId>, StoreError> {
        let mut ids = Vec::new();
        let mut cursor: Option<RecordId> = None;
        loop {
            let mut queries = vec![Query::limit(self.page_size())];
            if let Some(last) = &cursor {
                queries.push(Query::cursor_after(last));
            }
            let page = self.target.objects.list_files(bucket, &queries)?;
            let Some(last) = page.files.last() else {
                break;
            };
            cursor = Some(last.id.clone());
            let short = page.files.len() < self.page_size() as usize;
            ids.extend(page.files.into_iter().map(|f| f.id));
            if short {
                break;
            }
        }
        Ok(ids)
    }

    fn page_size(&self) -> u32 {
        self.pacing.page_size.max(1)
    }
}

/// Every document in `collection`, following the cursor `page_size` at a time.
pub(crate) fn list_all_documents(
    documents: &dyn DocumentStore,
    collection: &CollectionId,
    page_size: u32,
) -> Result<Vec<Document>, StoreError> {
    let page_size = page_size.max(1);
    let mut out: Vec<Document> = Vec::new();
    loop {
        let mut queries = vec![Query::limit(page_size)];
        if let Some(last) = out.last() {
            queries.push(Query::cursor_after(&last.id));
        }
        let page = documents.list_documents(collection, &queries)?;
        let short = page.documents.len() < page_size as usize;
        out.extend(page.documents);
        if short {
            break;
        }
    }
    Ok(out)
}
