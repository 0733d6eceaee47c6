//! キャンバスの永続化
//!
//! 永続化先のエラーは不透明な文字列として扱い、そのまま利用者に表示する。

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pitch_canvas_common::{CanvasDocument, Section};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;

/// 永続化先が返すエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct PersistenceError(pub String);

impl PersistenceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

pub type PersistResult<T> = std::result::Result<T, PersistenceError>;

/// セクションごとの保存結果
pub type FieldResults = BTreeMap<Section, PersistResult<()>>;

#[async_trait]
pub trait CanvasPersistence: Send + Sync {
    async fn load_document(&self) -> PersistResult<CanvasDocument>;

    async fn save_field(&self, section: Section, value: &str) -> PersistResult<()>;

    /// 複数セクションの保存。既定ではセクションごとに `save_field` を呼ぶ
    async fn save_all_fields(&self, fields: &[(Section, String)]) -> FieldResults {
        let mut results = BTreeMap::new();
        for (section, value) in fields {
            results.insert(*section, self.save_field(*section, value).await);
        }
        results
    }

    async fn clear_all_data(&self) -> PersistResult<()>;
}

/// 保存ファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CanvasRecord {
    /// バージョン（互換性チェック用）
    version: u32,
    startup_id: String,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    document: CanvasDocument,
}

impl CanvasRecord {
    const CURRENT_VERSION: u32 = 1;

    fn empty(startup_id: &str) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            startup_id: startup_id.to_string(),
            updated_at: None,
            document: CanvasDocument::default(),
        }
    }
}

/// スタートアップごとにJSONファイル1つへ保存するバックエンド
pub struct JsonFileBackend {
    path: PathBuf,
    startup_id: String,
    write_lock: Mutex<()>,
}

impl JsonFileBackend {
    pub fn new(data_dir: &Path, startup_id: &str) -> Self {
        Self {
            path: data_dir.join(format!("canvas-{}.json", startup_id)),
            startup_id: startup_id.to_string(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_record(&self) -> anyhow::Result<CanvasRecord> {
        let exists = tokio::fs::try_exists(&self.path)
            .await
            .with_context(|| format!("stat {}", self.path.display()))?;
        if !exists {
            return Ok(CanvasRecord::empty(&self.startup_id));
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("read {}", self.path.display()))?;
        let record: CanvasRecord = serde_json::from_str(&content)
            .with_context(|| format!("parse {}", self.path.display()))?;

        if record.version != CanvasRecord::CURRENT_VERSION {
            anyhow::bail!(
                "unsupported canvas file version {} in {}",
                record.version,
                self.path.display()
            );
        }
        Ok(record)
    }

    /// 一時ファイルに書いてからリネームする
    async fn write_record(&self, mut record: CanvasRecord) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create {}", parent.display()))?;
        }

        record.updated_at = Some(Utc::now());
        let content = serde_json::to_string_pretty(&record)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("rename to {}", self.path.display()))?;
        Ok(())
    }

    async fn update<F>(&self, apply: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut CanvasDocument) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut record = self.read_record().await?;
        apply(&mut record.document);
        self.write_record(record).await
    }
}

fn opaque(err: anyhow::Error) -> PersistenceError {
    PersistenceError(format!("{err:#}"))
}

#[async_trait]
impl CanvasPersistence for JsonFileBackend {
    async fn load_document(&self) -> PersistResult<CanvasDocument> {
        self.read_record().await.map(|r| r.document).map_err(opaque)
    }

    async fn save_field(&self, section: Section, value: &str) -> PersistResult<()> {
        self.update(|doc| doc.set(section, value)).await.map_err(opaque)
    }

    /// 1回の書き込みで全セクションを保存する（全成功か全失敗）
    async fn save_all_fields(&self, fields: &[(Section, String)]) -> FieldResults {
        let outcome = self
            .update(|doc| {
                for (section, value) in fields {
                    doc.set(*section, value.clone());
                }
            })
            .await
            .map_err(opaque);

        fields
            .iter()
            .map(|(section, _)| (*section, outcome.clone()))
            .collect()
    }

    async fn clear_all_data(&self) -> PersistResult<()> {
        let _guard = self.write_lock.lock().await;
        self.write_record(CanvasRecord::empty(&self.startup_id))
            .await
            .map_err(opaque)
    }
}
