use async_trait::async_trait;

use super::error::StorageError;

/// Resource type of a stored media object. The external store keeps images
/// and videos in distinct namespaces, so the same public id never collides
/// across kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Namespace segment used in storage paths and URLs.
    pub fn segment(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

/// Content-addressed external media store.
///
/// Public ids are `{folder}/{sha256}`, so identical bytes always land on the
/// same key and deduplication is inherent to the keying scheme. Callers probe
/// `exists` before uploading and upload with `overwrite = false`.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Check whether an object with this public id already exists.
    async fn exists(&self, public_id: &str, kind: MediaKind) -> Result<bool, StorageError>;

    /// Store bytes under the given public id and return the serving URL.
    ///
    /// With `overwrite = false`, an existing object is left untouched and its
    /// URL is returned.
    async fn upload(
        &self,
        data: &[u8],
        public_id: &str,
        kind: MediaKind,
        overwrite: bool,
    ) -> Result<String, StorageError>;

    /// The serving URL for a public id, whether or not the object exists.
    fn url_for(&self, public_id: &str, kind: MediaKind) -> String;
}
