//! Output directory layout
//!
//! Every artifact of a URL lands in one folder derived from that URL, below
//! the run's base directory.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Provides the run's output directories
#[async_trait]
pub trait StorageManager: Send + Sync {
    /// Root directory of the run
    fn base_dir(&self) -> &Path;

    /// Create `relative` below the base directory (with parents) and return
    /// its absolute path
    async fn create_sub_data_dir(&self, relative: &Path) -> io::Result<PathBuf>;
}

/// [`StorageManager`] writing to a local directory tree
#[derive(Debug, Clone)]
pub struct LocalStorageManager {
    base_dir: PathBuf,
}

impl LocalStorageManager {
    /// Create a storage manager rooted at `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

#[async_trait]
impl StorageManager for LocalStorageManager {
    fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    async fn create_sub_data_dir(&self, relative: &Path) -> io::Result<PathBuf> {
        let dir = self.base_dir.join(relative);
        tokio::fs::create_dir_all(&dir).await?;
        debug!("Created data dir {}", dir.display());
        Ok(dir)
    }
}

/// Options steering [`path_to_folder`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderOptions {
    /// Put every URL's artifacts directly into the base directory
    pub use_same_dir: bool,
}

/// Relative folder holding the artifacts of `url`
///
/// Layout: `pages/<host>/<path segments>/[<query hash>/]data`, where dots in
/// the host become underscores and the query is replaced by the first eight
/// hex digits of its SHA-256. With `use_same_dir` the folder is empty.
pub fn path_to_folder(url: &str, options: &FolderOptions) -> Result<PathBuf, url::ParseError> {
    if options.use_same_dir {
        return Ok(PathBuf::new());
    }

    let parsed = Url::parse(url)?;
    let mut folder = PathBuf::from("pages");
    folder.push(parsed.host_str().unwrap_or("localhost").replace('.', "_"));

    for segment in parsed
        .path_segments()
        .into_iter()
        .flatten()
        .filter(|segment| !segment.is_empty())
    {
        folder.push(sanitize_segment(segment));
    }

    if let Some(query) = parsed.query().filter(|query| !query.is_empty()) {
        let digest = Sha256::digest(query.as_bytes());
        folder.push(&hex::encode(digest)[..8]);
    }

    folder.push("data");
    Ok(folder)
}

fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_url() {
        let folder = path_to_folder("https://www.example.com/", &FolderOptions::default()).unwrap();
        assert_eq!(folder, PathBuf::from("pages/www_example_com/data"));
    }

    #[test]
    fn test_path_segments() {
        let folder =
            path_to_folder("https://example.com/docs/intro/", &FolderOptions::default()).unwrap();
        assert_eq!(folder, PathBuf::from("pages/example_com/docs/intro/data"));
    }

    #[test]
    fn test_query_is_hashed() {
        let a = path_to_folder("https://example.com/s?q=1", &FolderOptions::default()).unwrap();
        let b = path_to_folder("https://example.com/s?q=2", &FolderOptions::default()).unwrap();

        assert_ne!(a, b);
        assert!(a.starts_with("pages/example_com/s"));
        assert!(a.ends_with("data"));
        assert_eq!(a.components().count(), 5);
    }

    #[test]
    fn test_unsafe_characters_replaced() {
        let folder =
            path_to_folder("https://example.com/a%20b:c", &FolderOptions::default()).unwrap();
        assert_eq!(folder, PathBuf::from("pages/example_com/a-20b-c/data"));
    }

    #[test]
    fn test_same_dir() {
        let options = FolderOptions { use_same_dir: true };
        let folder = path_to_folder("https://example.com/a", &options).unwrap();
        assert_eq!(folder, PathBuf::new());
    }

    #[test]
    fn test_invalid_url() {
        assert!(path_to_folder("not a url", &FolderOptions::default()).is_err());
    }

    #[tokio::test]
    async fn test_create_sub_data_dir() {
        let temp = tempfile::tempdir().unwrap();
        let storage = LocalStorageManager::new(temp.path());

        let dir = storage
            .create_sub_data_dir(Path::new("pages/example_com/data"))
            .await
            .unwrap();

        assert_eq!(dir, temp.path().join("pages/example_com/data"));
        assert!(dir.is_dir());
        assert_eq!(storage.base_dir(), temp.path());
    }
}
