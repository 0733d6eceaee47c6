//! ピッチデッキの提出

use crate::error::{CanvasError, Result};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pitch_canvas_common::{FileKind, UploadBatch};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// 提出先が返す受領情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub location: String,
    pub submitted_at: DateTime<Utc>,
    pub file_count: usize,
}

#[async_trait]
pub trait DeckSubmitter: Send + Sync {
    async fn submit(&self, batch: &UploadBatch) -> Result<SubmissionReceipt>;
}

/// manifest.json の1件
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub name: String,
    pub stored_as: String,
    pub kind: FileKind,
    pub size: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionManifest {
    pub startup_id: String,
    pub submitted_at: DateTime<Utc>,
    pub files: Vec<ManifestEntry>,
}

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// 日時付きディレクトリにファイルをコピーして提出とする
#[derive(Debug, Clone)]
pub struct DirectorySubmitter {
    root: PathBuf,
    startup_id: String,
}

impl DirectorySubmitter {
    pub fn new(root: impl Into<PathBuf>, startup_id: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            startup_id: startup_id.into(),
        }
    }

    async fn copy_entry(source: &Path, target: &Path) -> anyhow::Result<(u64, String)> {
        let bytes = tokio::fs::read(source)
            .await
            .with_context(|| format!("read {}", source.display()))?;
        tokio::fs::write(target, &bytes)
            .await
            .with_context(|| format!("write {}", target.display()))?;
        Ok((bytes.len() as u64, hex::encode(Sha256::digest(&bytes))))
    }

    async fn write_submission(&self, batch: &UploadBatch) -> anyhow::Result<SubmissionReceipt> {
        let submitted_at = Utc::now();
        let dir = self
            .root
            .join(&self.startup_id)
            .join(submitted_at.format("%Y%m%d-%H%M%S%.3f").to_string());
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("create {}", dir.display()))?;

        let mut files = Vec::with_capacity(batch.len());
        for (index, entry) in batch.entries().iter().enumerate() {
            // 同名ファイルの衝突を避けるため番号を付ける
            let stored_as = format!("{:02}-{}", index + 1, entry.file.name);
            let (size, sha256) = Self::copy_entry(&entry.file.path, &dir.join(&stored_as)).await?;
            files.push(ManifestEntry {
                name: entry.file.name.clone(),
                stored_as,
                kind: entry.kind,
                size,
                sha256,
            });
        }

        let manifest = SubmissionManifest {
            startup_id: self.startup_id.clone(),
            submitted_at,
            files,
        };
        let content = serde_json::to_string_pretty(&manifest)?;
        tokio::fs::write(dir.join(MANIFEST_FILE_NAME), content)
            .await
            .context("write manifest")?;

        Ok(SubmissionReceipt {
            location: dir.display().to_string(),
            submitted_at,
            file_count: manifest.files.len(),
        })
    }
}

#[async_trait]
impl DeckSubmitter for DirectorySubmitter {
    async fn submit(&self, batch: &UploadBatch) -> Result<SubmissionReceipt> {
        self.write_submission(batch)
            .await
            .map_err(|e| CanvasError::Submission(format!("{e:#}")))
    }
}
