//! In-process store for tests and local rehearsal.
//!
//! [`InMemoryStore`] implements both [`DocumentStore`] and [`ObjectStore`]
//! with the backend's observable semantics: insertion-ordered listings,
//! equality filters, a default page limit, cursor pagination, 404 for unknown
//! collections and buckets, and 409 for duplicate ids. On top of that it
//! supports failure injection, relation rules that reject dangling
//! references, and a journal of every mutating call in order.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use menuseed_core::{BucketId, CollectionId, RecordId};

use crate::error::StoreError;
use crate::id::unique_id;
use crate::model::{
    Document, DocumentList, FetchedAsset, Fields, FileList, FileUpload, StoredFile,
};
use crate::query::{effective_limit, Query};
use crate::store::{AssetFetcher, DocumentStore, ObjectStore};

/// One recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    ListDocuments(CollectionId),
    CreateDocument(CollectionId, RecordId),
    DeleteDocument(CollectionId, RecordId),
    ListFiles(BucketId),
    CreateFile(BucketId, RecordId),
    DeleteFile(BucketId, RecordId),
}

#[derive(Debug, Clone)]
enum Fault {
    List { resource: String, allow: usize },
    Create {
        collection: CollectionId,
        attribute: String,
        value: Value,
        commit: bool,
    },
    Conflict {
        collection: CollectionId,
        attribute: String,
        value: Value,
        remaining: usize,
    },
    Delete(CollectionId, RecordId),
    CreateFile(BucketId),
    DeleteFile(BucketId, RecordId),
}

#[derive(Debug, Clone)]
struct Relation {
    collection: CollectionId,
    attribute: String,
    target: CollectionId,
}

#[derive(Debug, Clone)]
struct StoredObject {
    meta: StoredFile,
    bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct State {
    collections: BTreeMap<CollectionId, Vec<Document>>,
    buckets: BTreeMap<BucketId, Vec<StoredObject>>,
    faults: Vec<Fault>,
    relations: Vec<Relation>,
    journal: Vec<Op>,
}

/// Thread-safe in-memory document and object store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with every named collection and bucket already present.
    pub fn with_resources<'a>(
        collections: impl IntoIterator<Item = &'a CollectionId>,
        buckets: impl IntoIterator<Item = &'a BucketId>,
    ) -> Self {
        let store = Self::new();
        for c in collections {
            store.add_collection(c);
        }
        for b in buckets {
            store.add_bucket(b);
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not hide the store from later asserts.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // -- setup ---------------------------------------------------------------

    pub fn add_collection(&self, collection: &CollectionId) {
        self.lock().collections.entry(collection.clone()).or_default();
    }

    pub fn add_bucket(&self, bucket: &BucketId) {
        self.lock().buckets.entry(bucket.clone()).or_default();
    }

    /// Insert a document directly, bypassing faults, relations, and the journal.
    pub fn insert_document(&self, collection: &CollectionId, fields: Fields) -> RecordId {
        let id = unique_id();
        self.lock()
            .collections
            .entry(collection.clone())
            .or_default()
            .push(Document {
                id: id.clone(),
                fields,
            });
        id
    }

    /// Insert a file directly, bypassing faults and the journal.
    pub fn insert_file(&self, bucket: &BucketId, name: &str, bytes: Vec<u8>) -> RecordId {
        let id = unique_id();
        let meta = StoredFile {
            id: id.clone(),
            name: name.to_string(),
            mime_type: "application/octet-stream".to_string(),
            size: bytes.len() as u64,
        };
        self.lock()
            .buckets
            .entry(bucket.clone())
            .or_default()
            .push(StoredObject { meta, bytes });
        id
    }

    /// Reject creates in `collection` whose `attribute` names a document that
    /// does not exist in `target`.
    pub fn with_relation(&self, collection: &CollectionId, attribute: &str, target: &CollectionId) {
        self.lock().relations.push(Relation {
            collection: collection.clone(),
            attribute: attribute.to_string(),
            target: target.clone(),
        });
    }

    // -- failure injection ---------------------------------------------------

    /// Every listing of this collection or bucket fails with a 500.
    pub fn fail_list(&self, resource: &str) {
        self.fail_list_after(resource, 0);
    }

    /// Listings of this collection or bucket succeed `allow` times, then fail
    /// with a 500.
    pub fn fail_list_after(&self, resource: &str, allow: usize) {
        self.lock().faults.push(Fault::List {
            resource: resource.to_string(),
            allow,
        });
    }

    /// Creating a document whose `attribute` equals `value` fails with a 500.
    pub fn fail_create_where(
        &self,
        collection: &CollectionId,
        attribute: &str,
        value: impl Into<Value>,
    ) {
        self.lock().faults.push(Fault::Create {
            collection: collection.clone(),
            attribute: attribute.to_string(),
            value: value.into(),
            commit: false,
        });
    }

    /// Like [`fail_create_where`](Self::fail_create_where), but the document
    /// is persisted before the error is returned (a lost response).
    pub fn fail_create_after_commit_where(
        &self,
        collection: &CollectionId,
        attribute: &str,
        value: impl Into<Value>,
    ) {
        self.lock().faults.push(Fault::Create {
            collection: collection.clone(),
            attribute: attribute.to_string(),
            value: value.into(),
            commit: true,
        });
    }

    /// The next `times` creates whose `attribute` equals `value` answer 409,
    /// as if the generated id were already taken. Nothing is persisted.
    pub fn conflict_create_where(
        &self,
        collection: &CollectionId,
        attribute: &str,
        value: impl Into<Value>,
        times: usize,
    ) {
        self.lock().faults.push(Fault::Conflict {
            collection: collection.clone(),
            attribute: attribute.to_string(),
            value: value.into(),
            remaining: times,
        });
    }

    pub fn fail_delete(&self, collection: &CollectionId, id: &RecordId) {
        self.lock()
            .faults
            .push(Fault::Delete(collection.clone(), id.clone()));
    }

    pub fn fail_create_file(&self, bucket: &BucketId) {
        self.lock().faults.push(Fault::CreateFile(bucket.clone()));
    }

    pub fn fail_delete_file(&self, bucket: &BucketId, id: &RecordId) {
        self.lock()
            .faults
            .push(Fault::DeleteFile(bucket.clone(), id.clone()));
    }

    // -- inspection ----------------------------------------------------------

    pub fn documents(&self, collection: &CollectionId) -> Vec<Document> {
        self.lock()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn files(&self, bucket: &BucketId) -> Vec<StoredFile> {
        self.lock()
            .buckets
            .get(bucket)
            .map(|objs| objs.iter().map(|o| o.meta.clone()).collect())
            .unwrap_or_default()
    }

    pub fn file_bytes(&self, bucket: &BucketId, id: &RecordId) -> Option<Vec<u8>> {
        self.lock()
            .buckets
            .get(bucket)?
            .iter()
            .find(|o| &o.meta.id == id)
            .map(|o| o.bytes.clone())
    }

    pub fn journal(&self) -> Vec<Op> {
        self.lock().journal.clone()
    }
}

// ---------------------------------------------------------------------------
// Listing helpers
// ---------------------------------------------------------------------------

fn server_error(message: impl Into<String>) -> StoreError {
    StoreError::api(500, "general_unknown", message)
}

/// Consume one allowed listing of `resource`, or report that it must fail.
fn list_faulted(faults: &mut [Fault], resource: &str) -> bool {
    let mut faulted = false;
    for fault in faults.iter_mut() {
        if let Fault::List { resource: r, allow } = fault {
            if r == resource {
                if *allow == 0 {
                    faulted = true;
                } else {
                    *allow -= 1;
                }
            }
        }
    }
    faulted
}

fn matches_filters(fields: &Fields, queries: &[Query]) -> bool {
    queries.iter().all(|q| match q {
        Query::Equal { attribute, values } => fields
            .get(attribute)
            .map(|v| values.contains(v))
            .unwrap_or(false),
        _ => true,
    })
}

/// Apply equality filters, cursor, and limit to an ordered id/fields set.
fn page<'a, T: 'a>(
    items: impl Iterator<Item = (&'a RecordId, &'a Fields, T)>,
    queries: &[Query],
) -> Result<(u64, Vec<T>), StoreError> {
    let filtered: Vec<(&RecordId, T)> = items
        .filter(|(_, fields, _)| matches_filters(fields, queries))
        .map(|(id, _, item)| (id, item))
        .collect();
    let total = filtered.len() as u64;

    let cursor = queries.iter().rev().find_map(|q| match q {
        Query::CursorAfter(id) => Some(id),
        _ => None,
    });
    let start = match cursor {
        Some(cursor) => {
            let pos = filtered
                .iter()
                .position(|(id, _)| *id == cursor)
                .ok_or_else(|| {
                    StoreError::api(400, "general_cursor_not_found", format!("cursor {cursor}"))
                })?;
            pos + 1
        }
        None => 0,
    };

    let limit = effective_limit(queries) as usize;
    let page = filtered
        .into_iter()
        .skip(start)
        .take(limit)
        .map(|(_, item)| item)
        .collect();
    Ok((total, page))
}

fn no_fields() -> &'static Fields {
    static EMPTY: std::sync::OnceLock<Fields> = std::sync::OnceLock::new();
    EMPTY.get_or_init(Fields::new)
}

// ---------------------------------------------------------------------------
// DocumentStore
// ---------------------------------------------------------------------------

impl DocumentStore for InMemoryStore {
    fn list_documents(
        &self,
        collection: &CollectionId,
        queries: &[Query],
    ) -> Result<DocumentList, StoreError> {
        let mut state = self.lock();
        state.journal.push(Op::ListDocuments(collection.clone()));
        if list_faulted(&mut state.faults, &collection.0) {
            return Err(server_error(format!("cannot list {collection}")));
        }
        let docs = state.collections.get(collection).ok_or_else(|| {
            StoreError::api(404, "collection_not_found", format!("{collection}"))
        })?;
        let (total, documents) = page(
            docs.iter().map(|d| (&d.id, &d.fields, d.clone())),
            queries,
        )?;
        Ok(DocumentList { total, documents })
    }

    fn create_document(
        &self,
        collection: &CollectionId,
        id: &RecordId,
        fields: &Fields,
    ) -> Result<Document, StoreError> {
        let mut state = self.lock();
        state
            .journal
            .push(Op::CreateDocument(collection.clone(), id.clone()));

        let Some(existing) = state.collections.get(collection) else {
            return Err(StoreError::api(
                404,
                "collection_not_found",
                format!("{collection}"),
            ));
        };
        if existing.iter().any(|d| &d.id == id) {
            return Err(StoreError::api(
                409,
                "document_already_exists",
                format!("{id}"),
            ));
        }
        let collided = state.faults.iter_mut().any(|f| match f {
            Fault::Conflict {
                collection: c,
                attribute,
                value,
                remaining,
            } if *c == *collection
                && *remaining > 0
                && fields.get(attribute.as_str()) == Some(&*value) =>
            {
                *remaining -= 1;
                true
            }
            _ => false,
        });
        if collided {
            return Err(StoreError::api(
                409,
                "document_already_exists",
                format!("{id}"),
            ));
        }

        for rel in state.relations.iter().filter(|r| &r.collection == collection) {
            let Some(Value::String(target_id)) = fields.get(&rel.attribute) else {
                return Err(StoreError::api(
                    400,
                    "document_invalid_structure",
                    format!("missing reference `{}`", rel.attribute),
                ));
            };
            let exists = state
                .collections
                .get(&rel.target)
                .map(|docs| docs.iter().any(|d| d.id.0 == *target_id))
                .unwrap_or(false);
            if !exists {
                return Err(StoreError::api(
                    400,
                    "relationship_value_invalid",
                    format!("`{}` references missing {target_id}", rel.attribute),
                ));
            }
        }

        let fault = state.faults.iter().find_map(|f| match f {
            Fault::Create {
                collection: c,
                attribute,
                value,
                commit,
            } if c == collection && fields.get(attribute) == Some(value) => Some(*commit),
            _ => None,
        });

        let doc = Document {
            id: id.clone(),
            fields: fields.clone(),
        };
        match fault {
            Some(false) => Err(server_error("injected create failure")),
            Some(true) => {
                if let Some(docs) = state.collections.get_mut(collection) {
                    docs.push(doc);
                }
                Err(server_error("injected failure after commit"))
            }
            None => {
                if let Some(docs) = state.collections.get_mut(collection) {
                    docs.push(doc.clone());
                }
                Ok(doc)
            }
        }
    }

    fn delete_document(&self, collection: &CollectionId, id: &RecordId) -> Result<(), StoreError> {
        let mut state = self.lock();
        state
            .journal
            .push(Op::DeleteDocument(collection.clone(), id.clone()));
        if state
            .faults
            .iter()
            .any(|f| matches!(f, Fault::Delete(c, d) if c == collection && d == id))
        {
            return Err(server_error(format!("cannot delete {id}")));
        }
        let docs = state.collections.get_mut(collection).ok_or_else(|| {
            StoreError::api(404, "collection_not_found", format!("{collection}"))
        })?;
        let before = docs.len();
        docs.retain(|d| &d.id != id);
        if docs.len() == before {
            return Err(StoreError::api(404, "document_not_found", format!("{id}")));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ObjectStore
// ---------------------------------------------------------------------------

impl ObjectStore for InMemoryStore {
    fn list_files(&self, bucket: &BucketId, queries: &[Query]) -> Result<FileList, StoreError> {
        let mut state = self.lock();
        state.journal.push(Op::ListFiles(bucket.clone()));
        if list_faulted(&mut state.faults, &bucket.0) {
            return Err(server_error(format!("cannot list {bucket}")));
        }
        let objects = state
            .buckets
            .get(bucket)
            .ok_or_else(|| StoreError::api(404, "storage_bucket_not_found", format!("{bucket}")))?;
        let (total, files) = page(
            objects
                .iter()
                .map(|o| (&o.meta.id, no_fields(), o.meta.clone())),
            queries,
        )?;
        Ok(FileList { total, files })
    }

    fn create_file(
        &self,
        bucket: &BucketId,
        id: &RecordId,
        upload: &FileUpload,
    ) -> Result<StoredFile, StoreError> {
        let mut state = self.lock();
        state.journal.push(Op::CreateFile(bucket.clone(), id.clone()));
        if state
            .faults
            .iter()
            .any(|f| matches!(f, Fault::CreateFile(b) if b == bucket))
        {
            return Err(server_error("injected upload failure"));
        }
        let objects = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::api(404, "storage_bucket_not_found", format!("{bucket}")))?;
        if objects.iter().any(|o| &o.meta.id == id) {
            return Err(StoreError::api(409, "storage_file_already_exists", format!("{id}")));
        }
        let meta = StoredFile {
            id: id.clone(),
            name: upload.name.clone(),
            mime_type: upload.content_type.clone(),
            size: upload.size() as u64,
        };
        objects.push(StoredObject {
            meta: meta.clone(),
            bytes: upload.bytes.clone(),
        });
        Ok(meta)
    }

    fn delete_file(&self, bucket: &BucketId, id: &RecordId) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.journal.push(Op::DeleteFile(bucket.clone(), id.clone()));
        if state
            .faults
            .iter()
            .any(|f| matches!(f, Fault::DeleteFile(b, d) if b == bucket && d == id))
        {
            return Err(server_error(format!("cannot delete file {id}")));
        }
        let objects = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::api(404, "storage_bucket_not_found", format!("{bucket}")))?;
        let before = objects.len();
        objects.retain(|o| &o.meta.id != id);
        if objects.len() == before {
            return Err(StoreError::api(404, "storage_file_not_found", format!("{id}")));
        }
        Ok(())
    }

    fn file_view_url(&self, bucket: &BucketId, id: &RecordId) -> Result<String, StoreError> {
        Ok(format!("memory://{bucket}/{id}/view"))
    }
}

// ---------------------------------------------------------------------------
// StaticFetcher
// ---------------------------------------------------------------------------

/// An [`AssetFetcher`] answering from a fixed URL table.
///
/// Unknown URLs fail with a transport error.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    routes: HashMap<String, Result<FetchedAsset, StoreError>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, url: &str, bytes: &[u8], content_type: &str) -> Self {
        self.routes.insert(
            url.to_string(),
            Ok(FetchedAsset {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            }),
        );
        self
    }

    pub fn with_failure(mut self, url: &str, status: u16) -> Self {
        self.routes.insert(
            url.to_string(),
            Err(StoreError::api(status, "http_error", format!("GET {url}"))),
        );
        self
    }
}

impl AssetFetcher for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedAsset, StoreError> {
        match self.routes.get(url) {
            Some(Ok(asset)) if asset.bytes.is_empty() => Err(StoreError::EmptyPayload {
                url: url.to_string(),
            }),
            Some(result) => result.clone(),
            None => Err(StoreError::Transport(format!("no route to {url}"))),
        }
    }
}
