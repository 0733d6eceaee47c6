//! テスト用の協調オブジェクト
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use pitch_canvas::error::{CanvasError, Result};
use pitch_canvas::store::{CanvasPersistence, CanvasStore, PersistResult, PersistenceError};
use pitch_canvas::upload::{DeckSubmitter, FilePicker, SubmissionReceipt, Thumbnailer};
use pitch_canvas_common::{CanvasDocument, PickedFile, Section, UploadBatch};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// 保存を途中で止めるためのゲート
#[derive(Default)]
pub struct SaveGate {
    pub entered: Notify,
    pub release: Notify,
}

/// メモリ上の永続化先。失敗の注入と保存の一時停止ができる
#[derive(Default)]
pub struct FakePersistence {
    pub stored: Mutex<CanvasDocument>,
    pub saved: Mutex<Vec<(Section, String)>>,
    pub fail_message: Mutex<Option<String>>,
    pub failing_sections: Mutex<BTreeSet<Section>>,
    pub gate: Mutex<Option<Arc<SaveGate>>>,
    pub clear_calls: AtomicUsize,
}

impl FakePersistence {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_document(document: CanvasDocument) -> Arc<Self> {
        let fake = Self::default();
        *fake.stored.lock() = document;
        Arc::new(fake)
    }

    /// 以降の呼び出しをすべて失敗させる
    pub fn fail_all(&self, message: &str) {
        *self.fail_message.lock() = Some(message.to_string());
    }

    pub fn recover(&self) {
        self.fail_message.lock().take();
        self.failing_sections.lock().clear();
    }

    pub fn fail_section(&self, section: Section) {
        self.failing_sections.lock().insert(section);
    }

    /// 次の save_field を release まで止める
    pub fn hold_saves(&self) -> Arc<SaveGate> {
        let gate = Arc::new(SaveGate::default());
        *self.gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub fn save_calls(&self) -> Vec<(Section, String)> {
        self.saved.lock().clone()
    }

    fn failure(&self, section: Option<Section>) -> Option<PersistenceError> {
        if let Some(message) = self.fail_message.lock().clone() {
            return Some(PersistenceError::new(message));
        }
        match section {
            Some(s) if self.failing_sections.lock().contains(&s) => {
                Some(PersistenceError::new(format!("{} rejected", s.key())))
            }
            _ => None,
        }
    }
}

#[async_trait]
impl CanvasPersistence for FakePersistence {
    async fn load_document(&self) -> PersistResult<CanvasDocument> {
        if let Some(err) = self.failure(None) {
            return Err(err);
        }
        Ok(self.stored.lock().clone())
    }

    async fn save_field(&self, section: Section, value: &str) -> PersistResult<()> {
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        self.saved.lock().push((section, value.to_string()));
        if let Some(err) = self.failure(Some(section)) {
            return Err(err);
        }
        self.stored.lock().set(section, value);
        Ok(())
    }

    async fn clear_all_data(&self) -> PersistResult<()> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure(None) {
            return Err(err);
        }
        *self.stored.lock() = CanvasDocument::default();
        Ok(())
    }
}

/// 読み込み済みの状態ホルダを作る
pub async fn loaded_store(persistence: Arc<FakePersistence>) -> Arc<CanvasStore> {
    let store = CanvasStore::new(persistence);
    store.load().await.unwrap();
    store
}

/// 決まった結果を返すピッカー
pub struct FakePicker {
    result: Mutex<Option<Vec<PickedFile>>>,
    fail: bool,
}

impl FakePicker {
    pub fn returning(names: &[&str]) -> Arc<Self> {
        let files = names
            .iter()
            .map(|n| PickedFile::new(*n, format!("/uploads/{}", n)))
            .collect();
        Arc::new(Self {
            result: Mutex::new(Some(files)),
            fail: false,
        })
    }

    pub fn cancelled() -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(None),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(None),
            fail: true,
        })
    }
}

#[async_trait]
impl FilePicker for FakePicker {
    async fn pick_files(
        &self,
        _allow_multiple: bool,
        _allowed_extensions: &[&str],
    ) -> Result<Option<Vec<PickedFile>>> {
        if self.fail {
            return Err(CanvasError::Picker("picker unavailable".into()));
        }
        Ok(self.result.lock().clone())
    }
}

/// 指定したファイル名だけ生成に失敗するサムネイラ
#[derive(Default)]
pub struct FakeThumbnailer {
    pub failing: BTreeSet<String>,
    pub calls: AtomicUsize,
}

impl FakeThumbnailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_for(names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
            calls: AtomicUsize::new(0),
        })
    }

    fn render(&self, path: &Path) -> Result<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if self.failing.contains(&name) {
            return Err(CanvasError::Thumbnail(format!("cannot render {}", name)));
        }
        Ok(PathBuf::from(format!("/thumbs/{}.png", name)))
    }
}

#[async_trait]
impl Thumbnailer for FakeThumbnailer {
    async fn render_pdf_preview(&self, path: &Path) -> Result<PathBuf> {
        self.render(path)
    }

    async fn render_video_frame(&self, path: &Path) -> Result<PathBuf> {
        self.render(path)
    }
}

/// 呼び出し回数を数える提出先
#[derive(Default)]
pub struct FakeSubmitter {
    pub calls: AtomicUsize,
    pub fail_message: Mutex<Option<String>>,
    pub submitted_names: Mutex<Vec<String>>,
}

impl FakeSubmitter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeckSubmitter for FakeSubmitter {
    async fn submit(&self, batch: &UploadBatch) -> Result<SubmissionReceipt> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fail_message.lock().clone() {
            return Err(CanvasError::Submission(message));
        }
        *self.submitted_names.lock() = batch.entries().iter().map(|e| e.file.name.clone()).collect();
        Ok(SubmissionReceipt {
            location: "memory://deck".into(),
            submitted_at: Utc::now(),
            file_count: batch.len(),
        })
    }
}
