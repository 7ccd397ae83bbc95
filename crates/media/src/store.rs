use std::path::{Path, PathBuf};

use {rand::Rng, tracing::debug};

use parley_common::{ApiError, ApiResult};

/// A blob written to disk: public URL plus the local path used for
/// cascade deletes.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub url: String,
    pub local_path: String,
}

/// Writes uploads under a fixed public directory and derives their
/// serving URLs. Partially-written files from aborted uploads are not
/// cleaned up.
#[derive(Debug, Clone)]
pub struct BlobStore {
    dir: PathBuf,
    public_base_url: String,
}

impl BlobStore {
    /// `public_base_url` is the server's externally visible base, e.g.
    /// `http://127.0.0.1:8080`; blobs are served under `/images/`.
    pub fn new(dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> ApiResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(ApiError::internal)?;
        Ok(Self {
            dir,
            public_base_url: public_base_url.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store bytes under a de-duplicated name derived from the
    /// original filename.
    pub async fn store(&self, bytes: &[u8], original_name: &str) -> ApiResult<StoredBlob> {
        let filename = unique_filename(original_name);
        let path = self.dir.join(&filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(ApiError::internal)?;
        debug!(file = %path.display(), size = bytes.len(), "stored blob");
        Ok(StoredBlob {
            url: format!(
                "{}/images/{filename}",
                self.public_base_url.trim_end_matches('/')
            ),
            local_path: path.to_string_lossy().into_owned(),
        })
    }

    /// Remove a blob by its recorded local path. Missing files are not
    /// an error (the cascade may run twice).
    pub async fn delete(&self, local_path: &str) -> ApiResult<()> {
        if local_path.is_empty() {
            return Ok(());
        }
        match tokio::fs::remove_file(local_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApiError::internal(e)),
        }
    }
}

/// `photo of me.PNG` -> `photo-of-me-20240101120000-48213.png`
fn unique_filename(original: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("upload")
        .to_lowercase()
        .replace(' ', "-");
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();
    let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
    let suffix: u32 = rand::thread_rng().gen_range(0..100_000);
    format!("{stem}-{stamp}-{suffix}{ext}")
}
