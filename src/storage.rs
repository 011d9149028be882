use std::path::{Component, Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Disk-backed upload adapter. Incoming files are written under a single
/// directory with a generated, collision-resistant name; callers get back the
/// public URL the file is served under.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
    max_file_size: usize,
}

/// Result of persisting one upload.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub file_name: String,
    pub url: String,
    pub file_type: String,
}

impl UploadStore {
    pub fn new(root: PathBuf, max_file_size: usize) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root, max_file_size })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` to disk under `"{unix_millis}-{sanitized name}"` and
    /// returns the stored name, public URL and the original file extension.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> AppResult<StoredFile> {
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Empty file provided".into()));
        }
        if bytes.len() > self.max_file_size {
            return Err(AppError::BadRequest(format!(
                "File exceeds maximum size of {} bytes",
                self.max_file_size
            )));
        }

        let safe_name = sanitize_file_name(original_name);
        if safe_name.is_empty() {
            return Err(AppError::BadRequest("Invalid file name".into()));
        }

        let file_name = format!("{}-{}", chrono::Utc::now().timestamp_millis(), safe_name);
        let path = self.root.join(&file_name);
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!("Stored upload {} ({} bytes)", path.display(), bytes.len());

        Ok(StoredFile {
            url: format!("/uploads/{}", file_name),
            file_type: file_extension(original_name),
            file_name,
        })
    }
}

/// Reduces a client-supplied filename to its final path component and strips
/// characters that could escape the uploads directory.
fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .last()
        .unwrap_or("");

    base.chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect::<String>()
        .trim_matches('.')
        .to_string()
}

/// Extension of the original filename, dot included; empty when there is none.
/// Mirrors how clients usually display the type badge.
fn file_extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_path_components() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("/tmp/notes.pdf"), "notes.pdf");
        assert_eq!(sanitize_file_name("notes.pdf"), "notes.pdf");
    }

    #[test]
    fn extension_includes_dot() {
        assert_eq!(file_extension("notes.pdf"), ".pdf");
        assert_eq!(file_extension("archive.tar.gz"), ".gz");
        assert_eq!(file_extension("README"), "");
    }

    #[tokio::test]
    async fn save_prefixes_timestamp_and_writes_bytes() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf(), 1024).unwrap();

        let stored = store.save("notes.pdf", b"hello").await.unwrap();
        assert!(stored.file_name.ends_with("-notes.pdf"));
        assert_eq!(stored.url, format!("/uploads/{}", stored.file_name));
        assert_eq!(stored.file_type, ".pdf");

        let on_disk = std::fs::read(dir.path().join(&stored.file_name)).unwrap();
        assert_eq!(on_disk, b"hello");
    }

    #[tokio::test]
    async fn save_rejects_oversized_and_empty_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf(), 4).unwrap();

        assert!(store.save("big.bin", b"12345").await.is_err());
        assert!(store.save("empty.bin", b"").await.is_err());
    }
}
