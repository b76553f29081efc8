//! Blocking REST client for the hosted document database and storage API.
//!
//! Document calls live under `/databases/{db}/collections/{col}/documents`,
//! file calls under `/storage/buckets/{bucket}/files`. Large uploads are sent
//! in `CHUNK_SIZE` pieces with a `Content-Range` header, as the backend
//! requires.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::json;

use menuseed_core::{BucketId, CollectionId, RecordId, SeedConfig};

use crate::error::{ApiErrorBody, StoreError};
use crate::id::unique_id;
use crate::model::{Document, DocumentList, Fields, FileList, FileUpload, StoredFile};
use crate::query::Query;
use crate::store::{DocumentStore, ObjectStore};

/// Largest single upload request the backend accepts.
pub const CHUNK_SIZE: usize = 5 * 1024 * 1024;

const RESPONSE_FORMAT: &str = "1.5.0";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client bound to one project and database.
#[derive(Debug, Clone)]
pub struct AppwriteClient {
    agent: ureq::Agent,
    endpoint: String,
    project_id: String,
    database_id: String,
    api_key: Option<String>,
}

impl AppwriteClient {
    pub fn new(config: &SeedConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .user_agent(concat!("menuseed/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            database_id: config.database_id.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn documents_url(&self, collection: &CollectionId) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint, self.database_id, collection
        )
    }

    fn files_url(&self, bucket: &BucketId) -> String {
        format!("{}/storage/buckets/{}/files", self.endpoint, bucket)
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        tracing::debug!("{method} {url}");
        let req = self
            .agent
            .request(method, url)
            .set("X-Appwrite-Project", &self.project_id)
            .set("X-Appwrite-Response-Format", RESPONSE_FORMAT);
        match &self.api_key {
            Some(key) => req.set("X-Appwrite-Key", key),
            None => req,
        }
    }

    fn upload_chunk(
        &self,
        url: &str,
        id: &RecordId,
        upload: &FileUpload,
        start: usize,
    ) -> Result<StoredFile, StoreError> {
        let total = upload.size();
        let end = (start + CHUNK_SIZE).min(total);
        let boundary = format!("menuseed-{}", unique_id());
        let body = multipart_body(&boundary, id, &upload.name, &upload.content_type, &upload.bytes[start..end]);

        let mut req = self.request("POST", url).set(
            "Content-Type",
            &format!("multipart/form-data; boundary={boundary}"),
        );
        if total > CHUNK_SIZE {
            req = req.set(
                "Content-Range",
                &format!("bytes {}-{}/{}", start, end.saturating_sub(1), total),
            );
            if start > 0 {
                req = req.set("X-Appwrite-ID", &id.0);
            }
        }
        decode(req.send_bytes(&body))
    }
}

impl DocumentStore for AppwriteClient {
    fn list_documents(
        &self,
        collection: &CollectionId,
        queries: &[Query],
    ) -> Result<DocumentList, StoreError> {
        let req = with_queries(self.request("GET", &self.documents_url(collection)), queries);
        decode(req.call())
    }

    fn create_document(
        &self,
        collection: &CollectionId,
        id: &RecordId,
        fields: &Fields,
    ) -> Result<Document, StoreError> {
        let body = json!({ "documentId": id.0, "data": fields });
        decode(
            self.request("POST", &self.documents_url(collection))
                .send_json(body),
        )
    }

    fn delete_document(&self, collection: &CollectionId, id: &RecordId) -> Result<(), StoreError> {
        let url = format!("{}/{}", self.documents_url(collection), id);
        self.request("DELETE", &url).call().map_err(map_error)?;
        Ok(())
    }
}

impl ObjectStore for AppwriteClient {
    fn list_files(&self, bucket: &BucketId, queries: &[Query]) -> Result<FileList, StoreError> {
        let req = with_queries(self.request("GET", &self.files_url(bucket)), queries);
        decode(req.call())
    }

    fn create_file(
        &self,
        bucket: &BucketId,
        id: &RecordId,
        upload: &FileUpload,
    ) -> Result<StoredFile, StoreError> {
        let url = self.files_url(bucket);
        let mut start = 0;
        loop {
            let stored = self.upload_chunk(&url, id, upload, start)?;
            start += CHUNK_SIZE;
            if start >= upload.size() {
                return Ok(stored);
            }
        }
    }

    fn delete_file(&self, bucket: &BucketId, id: &RecordId) -> Result<(), StoreError> {
        let url = format!("{}/{}", self.files_url(bucket), id);
        self.request("DELETE", &url).call().map_err(map_error)?;
        Ok(())
    }

    fn file_view_url(&self, bucket: &BucketId, id: &RecordId) -> Result<String, StoreError> {
        Ok(format!(
            "{}/{}/view?project={}",
            self.files_url(bucket),
            id,
            self.project_id
        ))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn with_queries(mut req: ureq::Request, queries: &[Query]) -> ureq::Request {
    for query in queries {
        req = req.query("queries[]", &query.to_wire());
    }
    req
}

fn decode<T: DeserializeOwned>(result: Result<ureq::Response, ureq::Error>) -> Result<T, StoreError> {
    let response = result.map_err(map_error)?;
    response
        .into_json::<T>()
        .map_err(|e| StoreError::Decode(e.to_string()))
}

/// Translate a ureq failure into a [`StoreError`], decoding the backend's
/// error body when there is one.
pub(crate) fn map_error(err: ureq::Error) -> StoreError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(parsed) => parsed.into_error(status),
                Err(_) => StoreError::api(status, "unknown", body),
            }
        }
        ureq::Error::Transport(transport) => StoreError::Transport(transport.to_string()),
    }
}

fn multipart_body(
    boundary: &str,
    id: &RecordId,
    file_name: &str,
    content_type: &str,
    bytes: &[u8],
) -> Vec<u8> {
    let file_name = file_name.replace('"', "");
    let mut body = Vec::with_capacity(bytes.len() + 512);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"fileId\"\r\n\r\n{id}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> AppwriteClient {
        let mut config = SeedConfig::template("proj", "db", "assets");
        config.endpoint = "https://cloud.example.com/v1/".to_string();
        AppwriteClient::new(&config)
    }

    #[test]
    fn urls_strip_trailing_slash() {
        let c = client();
        assert_eq!(
            c.documents_url(&CollectionId::from("menu")),
            "https://cloud.example.com/v1/databases/db/collections/menu/documents"
        );
        assert_eq!(
            c.files_url(&BucketId::from("assets")),
            "https://cloud.example.com/v1/storage/buckets/assets/files"
        );
    }

    #[test]
    fn view_url_carries_project() {
        let url = client()
            .file_view_url(&BucketId::from("assets"), &RecordId::from("f1"))
            .expect("url");
        assert_eq!(
            url,
            "https://cloud.example.com/v1/storage/buckets/assets/files/f1/view?project=proj"
        );
    }

    #[test]
    fn multipart_body_has_both_parts_and_terminator() {
        let body = multipart_body(
            "b0",
            &RecordId::from("f1"),
            "burger\".png",
            "image/png",
            b"PNGDATA",
        );
        let text = String::from_utf8_lossy(&body);
        assert!(text.starts_with("--b0\r\n"));
        assert!(text.contains("name=\"fileId\"\r\n\r\nf1\r\n"));
        assert!(text.contains("filename=\"burger.png\""));
        assert!(text.contains("Content-Type: image/png\r\n\r\nPNGDATA\r\n"));
        assert!(text.ends_with("--b0--\r\n"));
    }
}
