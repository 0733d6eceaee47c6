//! キャンバス状態ホルダ
//!
//! 作業中の文書・最後に保存された文書・未保存フィールドを保持する。
//! ロックは短い区間だけ取得し、await をまたいで保持しない。

use super::persistence::{CanvasPersistence, PersistenceError};
use crate::error::{CanvasError, Result};
use parking_lot::Mutex;
use pitch_canvas_common::{CanvasDocument, DirtyFieldSet, Section};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 64;

/// 購読者に通知するイベント
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    Loaded,
    LoadFailed(String),
    FieldChanged(Section),
    FieldSaved(Section),
    SaveFailed { section: Section, message: String },
    BulkSaved { saved: usize, failed: usize },
    Cleared,
    ClearFailed(String),
}

/// 保存を実行しなかった理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 未変更
    Clean,
    /// 同じセクションを保存中
    AlreadySaving,
    /// 一括保存または全削除の実行中
    Busy,
    /// 画面が閉じられている
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Skipped(SkipReason),
}

/// 一括保存の結果（セクションごと）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkSaveReport {
    results: BTreeMap<Section, std::result::Result<(), String>>,
}

impl BulkSaveReport {
    /// 全セクション成功（対象なしも成功）
    pub fn is_success(&self) -> bool {
        self.results.values().all(|r| r.is_ok())
    }

    pub fn saved(&self) -> Vec<Section> {
        self.results
            .iter()
            .filter(|(_, r)| r.is_ok())
            .map(|(s, _)| *s)
            .collect()
    }

    pub fn failed(&self) -> Vec<(Section, &str)> {
        self.results
            .iter()
            .filter_map(|(s, r)| r.as_ref().err().map(|m| (*s, m.as_str())))
            .collect()
    }

    pub fn result(&self, section: Section) -> Option<&std::result::Result<(), String>> {
        self.results.get(&section)
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// 最初の失敗メッセージ（表示用）
    pub fn first_error(&self) -> Option<&str> {
        self.results.values().find_map(|r| r.as_ref().err().map(String::as_str))
    }
}

/// 全削除の確認トークン。`request_clear` からのみ取得できる
#[derive(Debug)]
pub struct ClearRequest {
    _private: (),
}

/// 表示用スナップショット
#[derive(Debug, Clone)]
pub struct CanvasSnapshot {
    pub document: CanvasDocument,
    pub dirty: DirtyFieldSet,
    pub saving: BTreeSet<Section>,
    pub loading: bool,
    pub bulk_saving: bool,
    pub clearing: bool,
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct CanvasState {
    working: CanvasDocument,
    persisted: CanvasDocument,
    dirty: DirtyFieldSet,
    saving: BTreeSet<Section>,
    loading: bool,
    bulk_saving: bool,
    clearing: bool,
    last_error: Option<String>,
}

impl CanvasState {
    fn refresh_dirty(&mut self, section: Section) {
        if self.working.get(section) == self.persisted.get(section) {
            self.dirty.unmark(section);
        } else {
            self.dirty.mark(section);
        }
    }

    fn skip_reason(&self, section: Section) -> Option<SkipReason> {
        if self.bulk_saving || self.clearing {
            Some(SkipReason::Busy)
        } else if self.saving.contains(&section) {
            Some(SkipReason::AlreadySaving)
        } else if !self.dirty.contains(section) {
            Some(SkipReason::Clean)
        } else {
            None
        }
    }
}

/// 状態ホルダ。画面には `Arc<CanvasStore>` で注入する
pub struct CanvasStore {
    persistence: Arc<dyn CanvasPersistence>,
    state: Mutex<CanvasState>,
    events: broadcast::Sender<CanvasEvent>,
}

/// 保存中フラグを解除するガード（future が破棄された場合も解除される）
struct SavingLatch<'a> {
    store: &'a CanvasStore,
    section: Section,
}

impl Drop for SavingLatch<'_> {
    fn drop(&mut self) {
        self.store.state.lock().saving.remove(&self.section);
    }
}

/// 一括処理フラグ用のガード
struct FlagLatch<'a> {
    store: &'a CanvasStore,
    flag: fn(&mut CanvasState) -> &mut bool,
}

impl Drop for FlagLatch<'_> {
    fn drop(&mut self) {
        let mut state = self.store.state.lock();
        *(self.flag)(&mut *state) = false;
    }
}

fn bulk_saving_flag(state: &mut CanvasState) -> &mut bool {
    &mut state.bulk_saving
}

fn clearing_flag(state: &mut CanvasState) -> &mut bool {
    &mut state.clearing
}

impl CanvasStore {
    pub fn new(persistence: Arc<dyn CanvasPersistence>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            persistence,
            state: Mutex::new(CanvasState::default()),
            events,
        })
    }

    /// 変更通知を購読する。Receiver の破棄で購読解除
    pub fn subscribe(&self) -> broadcast::Receiver<CanvasEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: CanvasEvent) {
        // 購読者がいない場合の送信失敗は無視
        let _ = self.events.send(event);
    }

    /// 永続化先から読み込み、作業コピーと未保存集合をリセットする
    ///
    /// 保存・一括保存・全削除の実行中は読み込まない。
    pub async fn load(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            if !state.saving.is_empty() || state.bulk_saving || state.clearing {
                debug!("load rejected while a write is in flight");
                return Err(CanvasError::SaveInFlight);
            }
            state.loading = true;
        }
        let result = self.persistence.load_document().await;

        let mut state = self.state.lock();
        state.loading = false;
        match result {
            Ok(document) => {
                state.working = document.clone();
                state.persisted = document;
                state.dirty.clear();
                state.last_error = None;
                drop(state);
                debug!("canvas loaded");
                self.emit(CanvasEvent::Loaded);
                Ok(())
            }
            Err(PersistenceError(message)) => {
                state.last_error = Some(message.clone());
                drop(state);
                warn!(error = %message, "canvas load failed");
                self.emit(CanvasEvent::LoadFailed(message.clone()));
                Err(CanvasError::Persistence(message))
            }
        }
    }

    pub fn value(&self, section: Section) -> String {
        self.state.lock().working.get(section).to_string()
    }

    pub fn persisted_value(&self, section: Section) -> String {
        self.state.lock().persisted.get(section).to_string()
    }

    pub fn document(&self) -> CanvasDocument {
        self.state.lock().working.clone()
    }

    pub fn snapshot(&self) -> CanvasSnapshot {
        let state = self.state.lock();
        CanvasSnapshot {
            document: state.working.clone(),
            dirty: state.dirty.clone(),
            saving: state.saving.clone(),
            loading: state.loading,
            bulk_saving: state.bulk_saving,
            clearing: state.clearing,
            last_error: state.last_error.clone(),
        }
    }

    /// 作業コピーを更新し、保存済みの値と比較して未保存集合を更新する
    pub fn edit(&self, section: Section, text: impl Into<String>) {
        let text = text.into();
        {
            let mut state = self.state.lock();
            if state.working.get(section) == text {
                return;
            }
            state.working.set(section, text);
            state.refresh_dirty(section);
        }
        self.emit(CanvasEvent::FieldChanged(section));
    }

    pub fn is_dirty(&self, section: Section) -> bool {
        self.state.lock().dirty.contains(section)
    }

    pub fn is_saving(&self, section: Section) -> bool {
        self.state.lock().saving.contains(&section)
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.state.lock().dirty.is_empty()
    }

    pub fn dirty_fields(&self) -> DirtyFieldSet {
        self.state.lock().dirty.clone()
    }

    pub fn completed_count(&self) -> usize {
        self.state.lock().working.completed_count()
    }

    pub fn completion_percentage(&self) -> f64 {
        self.state.lock().working.completion_percentage()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.lock().last_error.clone()
    }

    pub fn can_save(&self, section: Section) -> bool {
        self.state.lock().skip_reason(section).is_none()
    }

    /// 1セクションを保存する
    ///
    /// 未変更・保存中は何もしない。失敗時は未保存のまま残す。
    pub async fn save_field(&self, section: Section) -> Result<SaveOutcome> {
        let value = {
            let mut state = self.state.lock();
            if let Some(reason) = state.skip_reason(section) {
                debug!(section = section.key(), ?reason, "save skipped");
                return Ok(SaveOutcome::Skipped(reason));
            }
            state.saving.insert(section);
            state.working.get(section).to_string()
        };
        let _latch = SavingLatch {
            store: self,
            section,
        };

        let result = self.persistence.save_field(section, &value).await;

        let mut state = self.state.lock();
        match result {
            Ok(()) => {
                state.persisted.set(section, value);
                // 保存中に入力された場合は未保存のまま
                state.refresh_dirty(section);
                state.last_error = None;
                drop(state);
                info!(section = section.key(), "field saved");
                self.emit(CanvasEvent::FieldSaved(section));
                Ok(SaveOutcome::Saved)
            }
            Err(PersistenceError(message)) => {
                state.last_error = Some(message.clone());
                drop(state);
                warn!(section = section.key(), error = %message, "field save failed");
                self.emit(CanvasEvent::SaveFailed {
                    section,
                    message: message.clone(),
                });
                Err(CanvasError::Persistence(message))
            }
        }
    }

    /// 未保存の全セクションを保存し、セクションごとの結果を返す
    pub async fn save_all(&self) -> Result<BulkSaveReport> {
        let fields: Vec<(Section, String)> = {
            let mut state = self.state.lock();
            if state.bulk_saving || state.clearing || !state.saving.is_empty() {
                return Err(CanvasError::SaveInFlight);
            }
            if state.dirty.is_empty() {
                return Ok(BulkSaveReport::default());
            }
            state.bulk_saving = true;
            state
                .dirty
                .iter()
                .map(|s| (s, state.working.get(s).to_string()))
                .collect()
        };
        let _latch = FlagLatch {
            store: self,
            flag: bulk_saving_flag,
        };

        let results = self.persistence.save_all_fields(&fields).await;

        let mut report = BulkSaveReport::default();
        {
            let mut state = self.state.lock();
            for (section, value) in fields {
                let outcome = results
                    .get(&section)
                    .cloned()
                    .unwrap_or_else(|| Err(PersistenceError::new("no result returned")));
                match outcome {
                    Ok(()) => {
                        state.persisted.set(section, value);
                        state.refresh_dirty(section);
                        report.results.insert(section, Ok(()));
                    }
                    Err(PersistenceError(message)) => {
                        report.results.insert(section, Err(message));
                    }
                }
            }
            state.last_error = report.first_error().map(str::to_string);
        }

        let failed = report.failed().len();
        let saved = report.len() - failed;
        if failed == 0 {
            info!(saved, "all fields saved");
        } else {
            warn!(saved, failed, "bulk save partially failed");
        }
        self.emit(CanvasEvent::BulkSaved { saved, failed });
        Ok(report)
    }

    /// 全削除の1段階目
    pub fn request_clear(&self) -> ClearRequest {
        ClearRequest { _private: () }
    }

    /// 全削除の2段階目。成功時は全セクションを空にし未保存集合も空にする
    pub async fn confirm_clear(&self, _request: ClearRequest) -> Result<()> {
        {
            let mut state = self.state.lock();
            if state.clearing || state.bulk_saving || !state.saving.is_empty() {
                return Err(CanvasError::SaveInFlight);
            }
            state.clearing = true;
        }
        let _latch = FlagLatch {
            store: self,
            flag: clearing_flag,
        };

        let result = self.persistence.clear_all_data().await;

        let mut state = self.state.lock();
        match result {
            Ok(()) => {
                state.working = CanvasDocument::default();
                state.persisted = CanvasDocument::default();
                state.dirty.clear();
                state.last_error = None;
                drop(state);
                info!("canvas cleared");
                self.emit(CanvasEvent::Cleared);
                Ok(())
            }
            Err(PersistenceError(message)) => {
                state.last_error = Some(message.clone());
                drop(state);
                warn!(error = %message, "canvas clear failed");
                self.emit(CanvasEvent::ClearFailed(message.clone()));
                Err(CanvasError::Persistence(message))
            }
        }
    }
}
