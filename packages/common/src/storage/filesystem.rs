use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::traits::{MediaKind, MediaStore};

/// Filesystem-backed media store.
///
/// Objects live at `{base_path}/{kind}/{public_id}` and are served from
/// `{base_url}/{kind}/{public_id}`. Writes go through a temp file and an
/// atomic rename so concurrent uploads of the same content converge on one
/// object.
pub struct FilesystemMediaStore {
    base_path: PathBuf,
    base_url: String,
}

impl FilesystemMediaStore {
    pub async fn new(base_path: PathBuf, base_url: String) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn object_path(&self, public_id: &str, kind: MediaKind) -> PathBuf {
        self.base_path.join(kind.segment()).join(public_id)
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl MediaStore for FilesystemMediaStore {
    async fn exists(&self, public_id: &str, kind: MediaKind) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.object_path(public_id, kind)).await?)
    }

    async fn upload(
        &self,
        data: &[u8],
        public_id: &str,
        kind: MediaKind,
        overwrite: bool,
    ) -> Result<String, StorageError> {
        let object_path = self.object_path(public_id, kind);

        if !overwrite && fs::try_exists(&object_path).await? {
            return Ok(self.url_for(public_id, kind));
        }

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &object_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(self.url_for(public_id, kind))
    }

    fn url_for(&self, public_id: &str, kind: MediaKind) -> String {
        format!("{}/{}/{}", self.base_url, kind.segment(), public_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ContentHash;

    async fn temp_store() -> (FilesystemMediaStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemMediaStore::new(
            dir.path().join("media"),
            "https://media.test/apnaghar".into(),
        )
        .await
        .unwrap();
        (store, dir)
    }

    fn public_id(data: &[u8]) -> String {
        format!("milestones/{}", ContentHash::compute(data).to_hex())
    }

    #[tokio::test]
    async fn upload_then_exists() {
        let (store, _dir) = temp_store().await;
        let data = b"slab casting photo";
        let id = public_id(data);

        assert!(!store.exists(&id, MediaKind::Image).await.unwrap());
        store.upload(data, &id, MediaKind::Image, false).await.unwrap();
        assert!(store.exists(&id, MediaKind::Image).await.unwrap());
    }

    #[tokio::test]
    async fn upload_returns_stable_url() {
        let (store, _dir) = temp_store().await;
        let data = b"foundation video";
        let id = public_id(data);

        let url = store.upload(data, &id, MediaKind::Video, false).await.unwrap();
        assert_eq!(url, store.url_for(&id, MediaKind::Video));
        assert_eq!(url, format!("https://media.test/apnaghar/video/{id}"));
    }

    #[tokio::test]
    async fn duplicate_upload_without_overwrite_is_noop() {
        let (store, _dir) = temp_store().await;
        let data = b"duplicate bytes";
        let id = public_id(data);

        let url1 = store.upload(data, &id, MediaKind::Image, false).await.unwrap();
        let url2 = store.upload(data, &id, MediaKind::Image, false).await.unwrap();
        assert_eq!(url1, url2);
    }

    #[tokio::test]
    async fn kinds_do_not_collide() {
        let (store, _dir) = temp_store().await;
        let data = b"same bytes either way";
        let id = public_id(data);

        store.upload(data, &id, MediaKind::Image, false).await.unwrap();
        assert!(!store.exists(&id, MediaKind::Video).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_uploads_same_content() {
        let (store, _dir) = temp_store().await;
        let store = std::sync::Arc::new(store);
        let data = b"concurrent evidence".to_vec();
        let id = public_id(&data);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let data = data.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                store.upload(&data, &id, MediaKind::Image, false).await
            }));
        }

        let mut urls = Vec::new();
        for handle in handles {
            urls.push(handle.await.unwrap().unwrap());
        }
        assert!(urls.iter().all(|u| *u == urls[0]));
    }

    #[tokio::test]
    async fn trailing_slash_in_base_url_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemMediaStore::new(dir.path().join("m"), "http://cdn.test/".into())
            .await
            .unwrap();
        assert_eq!(
            store.url_for("units/abc", MediaKind::Image),
            "http://cdn.test/image/units/abc"
        );
    }
}
