//! Wire models shared by every store implementation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use menuseed_core::RecordId;

/// Document fields as sent to and received from the backend.
pub type Fields = Map<String, Value>;

/// A stored document. System attributes other than `$id` stay in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "$id")]
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Document {
    /// A string attribute, if present.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// One page of a document listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentList {
    pub total: u64,
    #[serde(default)]
    pub documents: Vec<Document>,
}

/// Metadata of a stored bucket object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    #[serde(rename = "$id")]
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "mimeType")]
    pub mime_type: String,
    #[serde(default, rename = "sizeOriginal")]
    pub size: u64,
}

/// One page of a file listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileList {
    pub total: u64,
    #[serde(default)]
    pub files: Vec<StoredFile>,
}

/// A binary object about to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Bytes retrieved from a source image URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedAsset {
    pub bytes: Vec<u8>,
    pub content_type: String,
}
