//! # menuseed-store
//!
//! Remote document/object store contract and its implementations.
//!
//! - [`DocumentStore`], [`ObjectStore`], [`AssetFetcher`]: what the seed
//!   pipeline consumes
//! - [`AppwriteClient`]: blocking REST client for the hosted backend
//! - [`HttpFetcher`]: source image retrieval
//! - [`memory`]: in-process store and fetcher with failure injection

pub mod appwrite;
pub mod error;
pub mod fetch;
pub mod id;
pub mod memory;
pub mod model;
pub mod query;
pub mod store;

pub use appwrite::AppwriteClient;
pub use error::StoreError;
pub use fetch::HttpFetcher;
pub use id::unique_id;
pub use model::{Document, DocumentList, FetchedAsset, Fields, FileList, FileUpload, StoredFile};
pub use query::Query;
pub use store::{AssetFetcher, DocumentStore, ObjectStore};
