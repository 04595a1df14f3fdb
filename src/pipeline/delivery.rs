//! Delivery port: hand a converted payload to the user.
//!
//! In a browser this is a temporary object URL behind a synthetic anchor
//! click; natively it is a file write. The workflow does not care which:
//! it calls [`Downloader::save`] once per successful conversion and keeps
//! nothing afterwards.

use crate::error::ConvertError;
use crate::model::DeliveredArtifact;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Platform capability that saves a payload under a suggested name.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn save(
        &self,
        payload: Bytes,
        suggested_name: &str,
    ) -> Result<DeliveredArtifact, ConvertError>;
}

/// Saves artifacts into a local directory.
///
/// The suggested name comes from a response header, so it is reduced to a
/// bare file name before use. Existing files are kept unless `overwrite` is
/// set; a numbered variant (`photo (1).png`) is chosen instead, the way a
/// browser's download manager does.
#[derive(Debug, Clone)]
pub struct DirectoryDownloader {
    dir: PathBuf,
    overwrite: bool,
}

impl DirectoryDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            overwrite: false,
        }
    }

    pub fn overwrite(mut self, v: bool) -> Self {
        self.overwrite = v;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn target_path(&self, name: &str) -> PathBuf {
        let first = self.dir.join(name);
        if self.overwrite || !exists(&first).await {
            return first;
        }

        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (name, None),
        };
        let mut n = 1u32;
        loop {
            let candidate = match ext {
                Some(ext) => self.dir.join(format!("{stem} ({n}).{ext}")),
                None => self.dir.join(format!("{stem} ({n})")),
            };
            if !exists(&candidate).await {
                return candidate;
            }
            n += 1;
        }
    }
}

#[async_trait]
impl Downloader for DirectoryDownloader {
    async fn save(
        &self,
        payload: Bytes,
        suggested_name: &str,
    ) -> Result<DeliveredArtifact, ConvertError> {
        let name = sanitize_filename(suggested_name);
        let fail = |path: &Path| {
            let path = path.to_path_buf();
            move |source| ConvertError::DeliveryFailed { path, source }
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(fail(&self.dir))?;

        let target = self.target_path(&name).await;
        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.clone());

        // Atomic write: temp file in the same directory, then rename.
        let tmp_path = self.dir.join(format!(".{file_name}.part"));
        if let Err(e) = tokio::fs::write(&tmp_path, &payload).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(fail(&target)(e));
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, &target).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(fail(&target)(e));
        }

        info!("Saved {} ({} bytes)", target.display(), payload.len());
        Ok(DeliveredArtifact {
            name: file_name,
            location: Some(target),
            bytes: payload.len(),
        })
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Reduce a header-supplied name to a safe bare file name.
///
/// Directory components are dropped, control and reserved characters are
/// replaced, and names that would be empty or a relative directory become
/// `download`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        debug!("Suggested name {:?} unusable, using fallback", name);
        "download".to_string()
    } else {
        cleaned.to_string()
    }
}
