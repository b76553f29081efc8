//! Moves a source image into the bucket and hands back its view URL.

use chrono::Utc;

use menuseed_core::{BucketId, RecordId};
use menuseed_store::{unique_id, AssetFetcher, FileUpload, ObjectStore, StoreError};

use crate::error::AssetError;

/// An image that now lives in the bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    pub file_id: RecordId,
    pub view_url: String,
}

pub struct AssetUploader<'a> {
    objects: &'a dyn ObjectStore,
    fetcher: &'a dyn AssetFetcher,
    bucket: &'a BucketId,
}

impl<'a> AssetUploader<'a> {
    pub fn new(
        objects: &'a dyn ObjectStore,
        fetcher: &'a dyn AssetFetcher,
        bucket: &'a BucketId,
    ) -> Self {
        Self {
            objects,
            fetcher,
            bucket,
        }
    }

    /// Fetch `url`, store it under a fresh id, and resolve its view URL.
    pub fn upload(&self, url: &str) -> Result<UploadedAsset, AssetError> {
        let asset = self.fetcher.fetch(url).map_err(|source| AssetError::Fetch {
            url: url.to_string(),
            source,
        })?;
        if asset.bytes.is_empty() {
            return Err(AssetError::Fetch {
                url: url.to_string(),
                source: StoreError::EmptyPayload {
                    url: url.to_string(),
                },
            });
        }

        let upload = FileUpload {
            name: file_name_from_url(url),
            content_type: asset.content_type,
            bytes: asset.bytes,
        };
        let file_id = unique_id();
        let upload_err = |source: StoreError| AssetError::Upload {
            url: url.to_string(),
            source,
        };
        let stored = self
            .objects
            .create_file(self.bucket, &file_id, &upload)
            .map_err(upload_err)?;
        let view_url = self
            .objects
            .file_view_url(self.bucket, &stored.id)
            .map_err(upload_err)?;

        tracing::debug!("uploaded {} ({} bytes) as {}", upload.name, upload.size(), stored.id);
        Ok(UploadedAsset {
            file_id: stored.id,
            view_url,
        })
    }
}

/// Trailing path segment of `url`, ignoring query and fragment. URLs with no
/// usable segment get a timestamped name.
pub fn file_name_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let path = path
        .split_once("://")
        .map(|(_, rest)| rest.split_once('/').map(|(_, p)| p).unwrap_or(""))
        .unwrap_or(path);
    match path.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment.to_string(),
        _ => format!("file-{}.jpg", Utc::now().timestamp_millis()),
    }
}

#[cfg(test)]
mod tests {
    use menuseed_store::memory::{InMemoryStore, StaticFetcher};
    use menuseed_store::FetchedAsset;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("https://cdn.example.com/images/burger.png", "burger.png")]
    #[case("https://cdn.example.com/a/b/pizza.jpg?w=200#top", "pizza.jpg")]
    #[case("relative/wrap.webp", "wrap.webp")]
    fn names_come_from_the_last_segment(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(file_name_from_url(url), expected);
    }

    #[rstest]
    #[case("https://cdn.example.com/")]
    #[case("https://cdn.example.com")]
    #[case("")]
    fn missing_segment_falls_back_to_timestamp(#[case] url: &str) {
        let name = file_name_from_url(url);
        assert!(name.starts_with("file-") && name.ends_with(".jpg"), "{name}");
    }

    #[test]
    fn upload_stores_bytes_and_returns_view_url() {
        let bucket = BucketId::from("assets");
        let store = InMemoryStore::new();
        store.add_bucket(&bucket);
        let fetcher = StaticFetcher::new().with_asset("https://a/x.png", b"png", "image/png");

        let asset = AssetUploader::new(&store, &fetcher, &bucket)
            .upload("https://a/x.png")
            .expect("upload");
        assert_eq!(asset.view_url, format!("memory://assets/{}/view", asset.file_id));
        assert_eq!(store.file_bytes(&bucket, &asset.file_id), Some(b"png".to_vec()));
        assert_eq!(store.files(&bucket)[0].name, "x.png");
    }

    #[test]
    fn fetch_and_upload_failures_are_distinguished() {
        let bucket = BucketId::from("assets");
        let store = InMemoryStore::new();
        store.add_bucket(&bucket);
        let fetcher = StaticFetcher::new()
            .with_failure("https://a/gone.png", 404)
            .with_asset("https://a/ok.png", b"ok", "image/png");
        let uploader = AssetUploader::new(&store, &fetcher, &bucket);

        assert!(matches!(
            uploader.upload("https://a/gone.png"),
            Err(AssetError::Fetch { .. })
        ));
        store.fail_create_file(&bucket);
        assert!(matches!(
            uploader.upload("https://a/ok.png"),
            Err(AssetError::Upload { .. })
        ));
        assert!(store.files(&bucket).is_empty());
    }

    /// Answers every URL with a successful, zero-byte body.
    struct HollowFetcher;

    impl AssetFetcher for HollowFetcher {
        fn fetch(&self, _url: &str) -> Result<FetchedAsset, StoreError> {
            Ok(FetchedAsset {
                bytes: Vec::new(),
                content_type: "image/png".to_string(),
            })
        }
    }

    #[test]
    fn zero_byte_fetch_is_rejected_before_upload() {
        let bucket = BucketId::from("assets");
        let store = InMemoryStore::new();
        store.add_bucket(&bucket);

        let err = AssetUploader::new(&store, &HollowFetcher, &bucket)
            .upload("https://a/blank.png")
            .unwrap_err();
        assert!(matches!(
            err,
            AssetError::Fetch {
                source: StoreError::EmptyPayload { .. },
                ..
            }
        ));
        assert!(store.files(&bucket).is_empty());
    }
}
