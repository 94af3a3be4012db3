//! Filesystem provider backed by a local directory.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::error::StorageError;
use crate::traits::FilesystemProvider;
use crate::types::{ByteContent, File, FileSource};

/// A [`FilesystemProvider`] storing files below a local directory.
#[derive(Debug, Clone)]
pub struct LocalFilesystem {
    root: PathBuf,
}

impl LocalFilesystem {
    /// Create a provider rooted at `root`. The directory is created lazily.
    ///
    /// A relative root is resolved against the current directory so that
    /// `file://` URLs can be built for it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = root.into();
        if root.is_absolute() {
            return Self { root };
        }
        match std::env::current_dir() {
            Ok(cwd) => Self {
                root: cwd.join(root),
            },
            Err(e) => {
                log::warn!("Keeping relative root {}: {}", root.display(), e);
                Self { root }
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local path of a file relative to the root.
    pub fn resolved_path(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

/// Write content to `target`, streaming chunk by chunk.
///
/// Chunks go to a temporary file in the same directory, which replaces
/// `target` only once the whole content is written. On error the temporary
/// file is removed and any previous `target` is left as it was.
async fn write_content(target: &Path, content: ByteContent) -> Result<u64, StorageError> {
    let display: String = target.display().to_string();
    let parent: &Path = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let (staging, staging_path) = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| StorageError::from_io(parent.display().to_string(), e))?
        .into_parts();
    let mut file = fs::File::from_std(staging);

    let mut written: u64 = 0;
    let mut stream = content.into_stream();
    while let Some(chunk) = stream.next().await {
        let chunk: Bytes = chunk?;
        file.write_all(&chunk)
            .await
            .map_err(|e| StorageError::from_io(&display, e))?;
        written += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|e| StorageError::from_io(&display, e))?;
    drop(file);

    staging_path
        .persist(target)
        .map_err(|e| StorageError::from_io(&display, e.error))?;
    Ok(written)
}

#[async_trait]
impl FilesystemProvider for LocalFilesystem {
    async fn get(&self, path: &str) -> Result<File, StorageError> {
        let target: PathBuf = self.resolved_path(path);
        let display: String = target.display().to_string();
        log::debug!("read {}", display);

        let data: Vec<u8> = fs::read(&target).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::NotFound {
                    bucket: self.root.display().to_string(),
                    key: path.to_string(),
                }
            } else {
                StorageError::from_io(&display, e)
            }
        })?;

        Ok(File {
            name: display.clone(),
            source: FileSource::Filesystem { path: display },
            size: Some(data.len() as u64),
            content: Some(ByteContent::from(data)),
        })
    }

    async fn create(&self, path: &str, content: ByteContent) -> Result<File, StorageError> {
        let target: PathBuf = self.resolved_path(path);
        log::debug!("write {}", target.display());

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::from_io(parent.display().to_string(), e))?;
        }
        write_content(&target, content).await?;

        Ok(File::stored(target.display().to_string()))
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let target: PathBuf = self.resolved_path(path);
        match fs::metadata(&target).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::from_io(target.display().to_string(), e)),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let target: PathBuf = self.resolved_path(path);
        match fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("Delete of missing file {}", target.display());
                Ok(())
            }
            Err(e) => Err(StorageError::from_io(target.display().to_string(), e)),
        }
    }

    fn url(&self, path: &str) -> Result<Url, StorageError> {
        let target: PathBuf = self.resolved_path(path);
        Url::from_file_path(&target).map_err(|_| StorageError::UrlUnavailable {
            url: target.display().to_string(),
        })
    }

    async fn temporary_url(
        &self,
        _path: &str,
        _expires_in: Duration,
        _headers: &HashMap<String, String>,
    ) -> Result<Url, StorageError> {
        Err(StorageError::Unsupported {
            operation: "temporary_url",
        })
    }

    fn directory(&self, path: &str) -> Arc<dyn FilesystemProvider> {
        Arc::new(LocalFilesystem::new(self.resolved_path(path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_then_get() {
        let temp_dir: TempDir = TempDir::new().unwrap();
        let fs = LocalFilesystem::new(temp_dir.path());

        fs.create("a/b.txt", ByteContent::from("hello")).await.unwrap();
        let file = fs.get("a/b.txt").await.unwrap();

        assert_eq!(file.size, Some(5));
        assert_eq!(&file.into_bytes().await.unwrap()[..], b"hello");
    }

    #[tokio::test]
    async fn test_create_from_stream() {
        let temp_dir: TempDir = TempDir::new().unwrap();
        let fs = LocalFilesystem::new(temp_dir.path());
        let chunks = vec![Ok(Bytes::from_static(b"ab")), Ok(Bytes::from_static(b"cd"))];

        fs.create("s.bin", ByteContent::from_stream(futures::stream::iter(chunks)))
            .await
            .unwrap();

        let on_disk: Vec<u8> = std::fs::read(temp_dir.path().join("s.bin")).unwrap();
        assert_eq!(on_disk, b"abcd");
    }

    #[tokio::test]
    async fn test_failed_stream_keeps_previous_content() {
        let temp_dir: TempDir = TempDir::new().unwrap();
        let fs = LocalFilesystem::new(temp_dir.path());
        fs.create("a.txt", ByteContent::from("original")).await.unwrap();

        let chunks = vec![
            Ok(Bytes::from_static(b"par")),
            Err(StorageError::Other {
                message: "producer failed".into(),
            }),
        ];
        let result = fs
            .create("a.txt", ByteContent::from_stream(futures::stream::iter(chunks)))
            .await;

        assert!(matches!(result, Err(StorageError::Other { .. })));
        assert!(fs.exists("a.txt").await.unwrap());
        let on_disk: Vec<u8> = std::fs::read(temp_dir.path().join("a.txt")).unwrap();
        assert_eq!(on_disk, b"original");
        let entries: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "no staging file may be left behind");
    }

    #[tokio::test]
    async fn test_failed_first_write_leaves_nothing() {
        let temp_dir: TempDir = TempDir::new().unwrap();
        let fs = LocalFilesystem::new(temp_dir.path());
        let chunks = vec![
            Ok(Bytes::from_static(b"par")),
            Err(StorageError::NetworkError {
                message: "reset".into(),
                retryable: true,
            }),
        ];

        let result = fs
            .create("new.txt", ByteContent::from_stream(futures::stream::iter(chunks)))
            .await;

        assert!(result.is_err());
        assert!(!fs.exists("new.txt").await.unwrap());
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_exists_and_idempotent_delete() {
        let temp_dir: TempDir = TempDir::new().unwrap();
        let fs = LocalFilesystem::new(temp_dir.path());

        assert!(!fs.exists("x.txt").await.unwrap());
        fs.create("x.txt", ByteContent::from("x")).await.unwrap();
        assert!(fs.exists("x.txt").await.unwrap());

        fs.delete("x.txt").await.unwrap();
        fs.delete("x.txt").await.unwrap();
        assert!(!fs.exists("x.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let temp_dir: TempDir = TempDir::new().unwrap();
        let fs = LocalFilesystem::new(temp_dir.path());
        assert!(fs.get("missing.txt").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_directory_scopes_below_root() {
        let temp_dir: TempDir = TempDir::new().unwrap();
        let fs = LocalFilesystem::new(temp_dir.path());

        fs.directory("images")
            .create("logo.png", ByteContent::from(vec![0u8; 4]))
            .await
            .unwrap();
        assert!(temp_dir.path().join("images/logo.png").is_file());
    }

    #[tokio::test]
    async fn test_url_and_temporary_url() {
        let temp_dir: TempDir = TempDir::new().unwrap();
        let fs = LocalFilesystem::new(temp_dir.path());

        let url = fs.url("a.txt").unwrap();
        assert_eq!(url.scheme(), "file");
        assert!(url.path().ends_with("/a.txt"));

        let result = fs
            .temporary_url("a.txt", Duration::from_secs(60), &HashMap::new())
            .await;
        assert!(matches!(result, Err(StorageError::Unsupported { .. })));
    }

    #[test]
    fn test_relative_root_builds_file_url() {
        let fs = LocalFilesystem::new("storage");
        assert!(fs.root().is_absolute());
        assert!(fs.root().ends_with("storage"));

        let url = fs.url("a/b.txt").unwrap();
        assert_eq!(url.scheme(), "file");
        assert!(url.path().ends_with("/storage/a/b.txt"));
    }
}
