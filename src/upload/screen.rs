//! ピッチデッキ提出画面
//!
//! ファイル選択 → 拡張子チェック → サムネイル生成 → 提出 の流れを管理する。
//! 提出は一度きりで、提出後のバッチは変更できない。

use super::picker::FilePicker;
use super::submission::{DeckSubmitter, SubmissionReceipt};
use super::thumbnail::{generate_thumbnail, Thumbnailer};
use crate::banner::Banner;
use crate::error::{CanvasError, Result};
use crate::lifecycle::{ActivationToken, ScreenLifetime};
use parking_lot::Mutex;
use pitch_canvas_common::{
    partition_allowed, PickedFile, UploadBatch, UploadEntry, ALLOWED_EXTENSIONS,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// ファイル選択の結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickResult {
    pub accepted: Vec<PickedFile>,
    /// 拒否したファイル名
    pub rejected: Vec<String>,
    pub cancelled: bool,
}

#[derive(Debug, Default)]
struct DeckState {
    batch: UploadBatch,
    processing: bool,
    submitting: bool,
    receipt: Option<SubmissionReceipt>,
    banner: Option<Banner>,
}

impl DeckState {
    fn ensure_editable(&self) -> Result<()> {
        if self.batch.is_submitted() {
            return Err(CanvasError::AlreadySubmitted);
        }
        if self.processing || self.submitting {
            return Err(CanvasError::UploadInFlight);
        }
        Ok(())
    }
}

pub struct PitchDeckScreen {
    picker: Arc<dyn FilePicker>,
    thumbnailer: Arc<dyn Thumbnailer>,
    submitter: Arc<dyn DeckSubmitter>,
    lifetime: ScreenLifetime,
    state: Mutex<DeckState>,
}

/// フラグを解除するガード
struct BusyLatch<'a> {
    state: &'a Mutex<DeckState>,
    flag: fn(&mut DeckState) -> &mut bool,
}

impl Drop for BusyLatch<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        *(self.flag)(&mut *state) = false;
    }
}

fn processing_flag(state: &mut DeckState) -> &mut bool {
    &mut state.processing
}

fn submitting_flag(state: &mut DeckState) -> &mut bool {
    &mut state.submitting
}

impl PitchDeckScreen {
    pub fn new(
        picker: Arc<dyn FilePicker>,
        thumbnailer: Arc<dyn Thumbnailer>,
        submitter: Arc<dyn DeckSubmitter>,
    ) -> Self {
        Self {
            picker,
            thumbnailer,
            submitter,
            lifetime: ScreenLifetime::new(),
            state: Mutex::new(DeckState::default()),
        }
    }

    fn show(&self, token: &ActivationToken, banner: Banner) {
        if token.is_live() {
            self.state.lock().banner = Some(banner);
        }
    }

    /// ファイルを選択し、許可リストで振り分ける
    pub async fn pick_files(&self) -> Result<PickResult> {
        self.state.lock().ensure_editable()?;
        let token = self.lifetime.token();

        let picked = match self.picker.pick_files(true, ALLOWED_EXTENSIONS).await {
            Ok(picked) => picked,
            Err(err) => {
                warn!(error = %err, "file picker failed");
                self.show(&token, Banner::error(err.to_string()));
                return Err(err);
            }
        };

        let Some(files) = picked else {
            debug!("file pick cancelled");
            return Ok(PickResult {
                cancelled: true,
                ..Default::default()
            });
        };

        // ピッカーの絞り込みに依存せず、ここで必ず検査する
        let (accepted, rejected) = partition_allowed(files);
        let rejected: Vec<String> = rejected.into_iter().map(|f| f.name).collect();

        if !rejected.is_empty() {
            self.show(
                &token,
                Banner::warning(format!(
                    "対応していないファイル形式です: {} (対応形式: {})",
                    rejected.join(", "),
                    ALLOWED_EXTENSIONS.join(", ")
                )),
            );
        }

        Ok(PickResult {
            accepted,
            rejected,
            cancelled: false,
        })
    }

    /// 受け付けたファイルのサムネイルを作ってバッチに追加する。追加件数を返す
    pub async fn process_accepted(&self, files: Vec<PickedFile>) -> Result<usize> {
        self.process_accepted_with(files, |_| {}).await
    }

    /// 1件追加するたびに `on_added` を呼ぶ
    pub async fn process_accepted_with<F>(&self, files: Vec<PickedFile>, mut on_added: F) -> Result<usize>
    where
        F: FnMut(&UploadEntry) + Send,
    {
        {
            let mut state = self.state.lock();
            state.ensure_editable()?;
            state.processing = true;
        }
        let _latch = BusyLatch {
            state: &self.state,
            flag: processing_flag,
        };

        let mut added = 0;
        for file in files {
            let Some(kind) = file.kind() else {
                debug!(file = %file.name, "unsupported file skipped");
                continue;
            };
            let thumbnail = generate_thumbnail(self.thumbnailer.as_ref(), &file, kind).await;
            let entry = UploadEntry {
                file,
                kind,
                thumbnail,
            };
            on_added(&entry);
            self.state.lock().batch.push(entry);
            added += 1;
        }

        debug!(added, "files added to pitch deck");
        Ok(added)
    }

    /// 添字のファイルとサムネイルを削除する
    pub fn remove_file(&self, index: usize) -> Result<UploadEntry> {
        let mut state = self.state.lock();
        state.ensure_editable()?;
        state
            .batch
            .remove(index)
            .ok_or(CanvasError::InvalidIndex(index))
    }

    /// 提出する。空のバッチは提出先を呼ばずに拒否する
    pub async fn submit(&self) -> Result<SubmissionReceipt> {
        let token = self.lifetime.token();
        let batch = {
            let mut state = self.state.lock();
            if state.batch.is_submitted() {
                return Err(CanvasError::AlreadySubmitted);
            }
            if state.submitting {
                return Err(CanvasError::SubmissionInFlight);
            }
            if state.processing {
                return Err(CanvasError::UploadInFlight);
            }
            if state.batch.is_empty() {
                if token.is_live() {
                    state.banner = Some(Banner::warning("提出する前にファイルを1件以上追加してください"));
                }
                return Err(CanvasError::EmptyBatch);
            }
            state.submitting = true;
            state.batch.clone()
        };
        let _latch = BusyLatch {
            state: &self.state,
            flag: submitting_flag,
        };

        match self.submitter.submit(&batch).await {
            Ok(receipt) => {
                {
                    let mut state = self.state.lock();
                    state.batch.mark_submitted(receipt.submitted_at);
                    state.receipt = Some(receipt.clone());
                }
                info!(files = receipt.file_count, location = %receipt.location, "pitch deck submitted");
                self.show(&token, Banner::success("ピッチデッキを提出しました"));
                Ok(receipt)
            }
            Err(err) => {
                warn!(error = %err, "pitch deck submission failed");
                self.show(&token, Banner::error(err.to_string()));
                Err(err)
            }
        }
    }

    pub fn batch(&self) -> UploadBatch {
        self.state.lock().batch.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().batch.is_empty()
    }

    pub fn is_submitted(&self) -> bool {
        self.state.lock().batch.is_submitted()
    }

    pub fn is_busy(&self) -> bool {
        let state = self.state.lock();
        state.processing || state.submitting
    }

    /// 提出ボタンの有効状態
    pub fn can_submit(&self) -> bool {
        let state = self.state.lock();
        !state.batch.is_empty() && !state.batch.is_submitted() && !state.processing && !state.submitting
    }

    pub fn receipt(&self) -> Option<SubmissionReceipt> {
        self.state.lock().receipt.clone()
    }

    pub fn banner(&self) -> Option<Banner> {
        self.state.lock().banner.clone()
    }

    pub fn take_banner(&self) -> Option<Banner> {
        self.state.lock().banner.take()
    }

    pub fn deactivate(&self) {
        self.lifetime.deactivate();
    }
}
