//! Capability contracts consumed by the seed pipeline.
//!
//! Every call blocks the caller until the backend answers; the pipeline
//! drives them one at a time.

use menuseed_core::{BucketId, CollectionId, RecordId};

use crate::error::StoreError;
use crate::model::{Document, DocumentList, FetchedAsset, Fields, FileList, FileUpload, StoredFile};
use crate::query::Query;

/// Collection-scoped document CRUD.
pub trait DocumentStore: Send + Sync {
    fn list_documents(
        &self,
        collection: &CollectionId,
        queries: &[Query],
    ) -> Result<DocumentList, StoreError>;

    fn create_document(
        &self,
        collection: &CollectionId,
        id: &RecordId,
        fields: &Fields,
    ) -> Result<Document, StoreError>;

    fn delete_document(&self, collection: &CollectionId, id: &RecordId) -> Result<(), StoreError>;
}

/// Bucket-scoped binary object storage.
pub trait ObjectStore: Send + Sync {
    fn list_files(&self, bucket: &BucketId, queries: &[Query]) -> Result<FileList, StoreError>;

    fn create_file(
        &self,
        bucket: &BucketId,
        id: &RecordId,
        upload: &FileUpload,
    ) -> Result<StoredFile, StoreError>;

    fn delete_file(&self, bucket: &BucketId, id: &RecordId) -> Result<(), StoreError>;

    /// Durable, publicly resolvable URL for a stored object.
    fn file_view_url(&self, bucket: &BucketId, id: &RecordId) -> Result<String, StoreError>;
}

/// Retrieval of source images by URL.
pub trait AssetFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<FetchedAsset, StoreError>;
}
