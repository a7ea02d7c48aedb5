//! Upload/media gate: stores uploaded files under a local directory, sniffs
//! their content and removes them again.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::io::AsyncReadExt;
use uuid::Uuid;

/// Image types accepted as payment proof.
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/webp"];

/// Enough of the file to recognise every format `infer` knows.
const SNIFF_LEN: u64 = 8192;

pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: PathBuf,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileCheck {
    Valid { mime: String },
    Invalid { reason: String },
}

#[derive(Debug, Clone)]
pub struct MediaGate {
    root: PathBuf,
    public_base_url: String,
}

impl MediaGate {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` under a fresh name, keeping a sane extension from the
    /// client-supplied name.
    pub async fn store(&self, original_name: Option<&str>, bytes: &[u8]) -> Result<StoredFile> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create upload dir {}", self.root.display()))?;

        let extension = original_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .unwrap_or_default();
        let file_name = format!(
            "{}-{}{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            extension
        );

        let path = self.root.join(&file_name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write upload {}", path.display()))?;

        Ok(StoredFile {
            url: format!("{}{}/{}", self.public_base_url, PUBLIC_PREFIX, file_name),
            path,
        })
    }

    /// Sniffs the file's leading bytes; the file name plays no part.
    pub async fn validate(&self, path: &Path) -> FileCheck {
        let head = match read_head(path).await {
            Ok(head) => head,
            Err(err) => {
                return FileCheck::Invalid {
                    reason: format!("Error reading file: {}", err),
                };
            }
        };

        match infer::get(&head) {
            None => FileCheck::Invalid {
                reason: "File type could not be determined.".into(),
            },
            Some(kind) if ALLOWED_IMAGE_TYPES.contains(&kind.mime_type()) => FileCheck::Valid {
                mime: kind.mime_type().to_string(),
            },
            Some(kind) => FileCheck::Invalid {
                reason: format!("Unsupported file type: {}", kind.mime_type()),
            },
        }
    }

    /// Maps a public URL produced by [`MediaGate::store`] (or a legacy URL
    /// with another host) back to a path under the upload dir.
    pub fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let (_, file_name) = url.rsplit_once(&format!("{}/", PUBLIC_PREFIX))?;
        let safe = !file_name.is_empty()
            && !file_name.contains(['/', '\\'])
            && file_name != "."
            && file_name != "..";
        safe.then(|| self.root.join(file_name))
    }

    /// Best-effort removal; a missing file counts as removed and other
    /// failures are only logged.
    pub async fn remove(&self, url: &str) {
        let Some(path) = self.path_for_url(url) else {
            tracing::warn!("Not removing {}: not a stored upload", url);
            return;
        };
        remove_path(&path).await;
    }

    pub async fn discard(&self, files: &[StoredFile]) {
        for file in files {
            remove_path(&file.path).await;
        }
    }
}

async fn read_head(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = tokio::fs::File::open(path).await?;
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    file.take(SNIFF_LEN).read_to_end(&mut head).await?;
    Ok(head)
}

async fn remove_path(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!("Removed upload {}", path.display()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("Upload {} already gone", path.display())
        }
        Err(err) => tracing::warn!("Failed to remove upload {}: {}", path.display(), err),
    }
}
