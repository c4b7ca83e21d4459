//! Product image storage.
//!
//! Uploaded files are stored under a timestamped name and addressed by a
//! public URL. Files are never overwritten.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};

/// File extensions accepted as product images.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "avif"];

/// Errors raised while storing uploads.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("file name is missing or invalid")]
    InvalidFileName,

    #[error("unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("uploaded file {0} is empty")]
    Empty(String),

    #[error("a file named {0} already exists")]
    AlreadyExists(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One uploaded file as received from a multipart form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Where image bytes end up.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Write `content` under `name`. Fails if `name` is taken.
    async fn save(&self, name: &str, content: &[u8]) -> Result<(), MediaError>;
}

/// Stores files in a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    base_path: PathBuf,
}

impl LocalMediaStore {
    /// Use `base_path`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Io` if the directory cannot be created.
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self, MediaError> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await?;
        Ok(Self { base_path })
    }

    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn save(&self, name: &str, content: &[u8]) -> Result<(), MediaError> {
        let path = self.base_path.join(name);

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => MediaError::AlreadyExists(name.to_string()),
                _ => MediaError::Io(e),
            })?;
        file.write_all(content).await?;
        file.flush().await?;

        tracing::debug!(path = %path.display(), bytes = content.len(), "Stored upload");
        Ok(())
    }
}

/// Keeps files in memory, in the order they were saved.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Default)]
pub struct MemoryMediaStore {
    files: std::sync::Mutex<Vec<(String, Vec<u8>)>>,
}

#[cfg(any(test, feature = "test-support"))]
impl MemoryMediaStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of stored files, oldest first.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.files
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn save(&self, name: &str, content: &[u8]) -> Result<(), MediaError> {
        let mut files = self
            .files
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if files.iter().any(|(existing, _)| existing == name) {
            return Err(MediaError::AlreadyExists(name.to_string()));
        }
        files.push((name.to_string(), content.to_vec()));
        Ok(())
    }
}

/// Names, validates and stores uploads, returning their public URLs.
pub struct MediaService<'a> {
    store: &'a dyn MediaStore,
    public_url: &'a str,
}

impl<'a> MediaService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn MediaStore, public_url: &'a str) -> Self {
        Self { store, public_url }
    }

    /// Store every upload and return their URLs in upload order.
    ///
    /// Stops at the first failure; files already written stay in place.
    ///
    /// # Errors
    ///
    /// Returns a `MediaError` for a bad name, unsupported type, empty file
    /// or storage failure.
    pub async fn store_all(&self, uploads: &[Upload]) -> Result<Vec<String>, MediaError> {
        let mut urls = Vec::with_capacity(uploads.len());
        let mut last_stamp = 0;

        for upload in uploads {
            let base = sanitize_file_name(&upload.file_name)?;
            if upload.bytes.is_empty() {
                return Err(MediaError::Empty(base));
            }

            // Strictly increasing stamps keep names unique and sortable
            // within one batch.
            let stamp = Utc::now().timestamp_millis().max(last_stamp + 1);
            last_stamp = stamp;

            let name = format!("{stamp}-{base}");
            self.store.save(&name, &upload.bytes).await?;
            urls.push(format!("{}/{name}", self.public_url.trim_end_matches('/')));
        }

        tracing::info!(count = urls.len(), "Stored product images");
        Ok(urls)
    }
}

/// Reduce a client-supplied file name to a safe single path segment.
///
/// Directory components are dropped, whitespace runs become hyphens and
/// anything outside `[A-Za-z0-9._-]` is removed.
///
/// # Errors
///
/// Returns `MediaError::InvalidFileName` if nothing usable remains and
/// `MediaError::UnsupportedType` if the extension is not an image type.
pub fn sanitize_file_name(raw: &str) -> Result<String, MediaError> {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or_default();

    let mut cleaned = String::with_capacity(last.len());
    for word in last.split_whitespace() {
        if !cleaned.is_empty() {
            cleaned.push('-');
        }
        cleaned.extend(
            word.chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')),
        );
    }
    let cleaned = cleaned.trim_start_matches('.').to_string();

    let (stem, extension) = cleaned
        .rsplit_once('.')
        .ok_or(MediaError::InvalidFileName)?;
    if stem.is_empty() {
        return Err(MediaError::InvalidFileName);
    }

    let extension = extension.to_ascii_lowercase();
    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(MediaError::UnsupportedType(extension));
    }

    Ok(format!("{stem}.{extension}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn upload(name: &str) -> Upload {
        Upload {
            file_name: name.to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF],
        }
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("front view.JPG").unwrap(), "front-view.jpg");
        assert_eq!(sanitize_file_name("../../etc/shirt.png").unwrap(), "shirt.png");
        assert_eq!(sanitize_file_name("C:\\pics\\tee (1).webp").unwrap(), "tee-1.webp");
        assert!(matches!(
            sanitize_file_name("notes.txt"),
            Err(MediaError::UnsupportedType(ext)) if ext == "txt"
        ));
        assert!(matches!(sanitize_file_name(".png"), Err(MediaError::InvalidFileName)));
        assert!(matches!(sanitize_file_name("noext"), Err(MediaError::InvalidFileName)));
    }

    #[tokio::test]
    async fn test_store_all_keeps_upload_order() {
        let store = MemoryMediaStore::new();
        let media = MediaService::new(&store, "http://localhost:3000/media/");

        let urls = media
            .store_all(&[upload("c.png"), upload("a.png"), upload("b.png")])
            .await
            .unwrap();

        assert_eq!(urls.len(), 3);
        assert!(urls[0].starts_with("http://localhost:3000/media/"));
        assert!(urls[0].ends_with("-c.png"));
        assert!(urls[1].ends_with("-a.png"));
        assert!(urls[2].ends_with("-b.png"));
        assert_eq!(store.names().len(), 3);
    }

    #[tokio::test]
    async fn test_same_name_twice_in_one_batch_gets_distinct_names() {
        let store = MemoryMediaStore::new();
        let media = MediaService::new(&store, "/media");

        let urls = media
            .store_all(&[upload("tee.png"), upload("tee.png")])
            .await
            .unwrap();
        assert_ne!(urls[0], urls[1]);
    }

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let store = MemoryMediaStore::new();
        let media = MediaService::new(&store, "/media");
        let empty = Upload {
            file_name: "a.png".into(),
            bytes: Vec::new(),
        };

        assert!(matches!(media.store_all(&[empty]).await, Err(MediaError::Empty(_))));
        assert!(store.names().is_empty());
    }

    #[tokio::test]
    async fn test_local_store_refuses_overwrite() {
        let dir = std::env::temp_dir().join(format!("stitchline-media-{}", std::process::id()));
        let store = LocalMediaStore::new(dir.clone()).await.unwrap();

        store.save("1-a.png", b"one").await.unwrap();
        assert!(matches!(
            store.save("1-a.png", b"two").await,
            Err(MediaError::AlreadyExists(_))
        ));
        assert_eq!(fs::read(dir.join("1-a.png")).await.unwrap(), b"one");

        fs::remove_dir_all(&dir).await.unwrap();
    }
}
