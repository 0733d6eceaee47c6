//! キャンバス一覧画面
//!
//! 9セクションの完了状況と未保存状況を集計し、一括保存と全削除を提供する。

use crate::banner::Banner;
use crate::error::Result;
use crate::lifecycle::{ActivationToken, ScreenLifetime};
use crate::store::{BulkSaveReport, CanvasStore, ClearRequest};
use parking_lot::Mutex;
use pitch_canvas_common::Section;
use std::sync::Arc;
use tracing::debug;

/// 一覧の1行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRow {
    pub section: Section,
    pub title: &'static str,
    pub icon: &'static str,
    pub complete: bool,
    pub dirty: bool,
    pub saving: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    Cleared,
    /// 確認ダイアログが開かれていない
    NotRequested,
}

pub struct CanvasOverview {
    store: Arc<CanvasStore>,
    lifetime: ScreenLifetime,
    clear_dialog: Mutex<Option<ClearRequest>>,
    banner: Mutex<Option<Banner>>,
}

impl CanvasOverview {
    pub fn new(store: Arc<CanvasStore>) -> Self {
        Self {
            store,
            lifetime: ScreenLifetime::new(),
            clear_dialog: Mutex::new(None),
            banner: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<CanvasStore> {
        &self.store
    }

    /// 画面表示時の読み込み
    pub async fn load(&self) -> Result<()> {
        let token = self.lifetime.token();
        let result = self.store.load().await;
        if let Err(err) = &result {
            self.show(&token, Banner::error(err.to_string()));
        }
        result
    }

    pub fn rows(&self) -> Vec<SectionRow> {
        let snapshot = self.store.snapshot();
        Section::ALL
            .iter()
            .map(|&section| SectionRow {
                section,
                title: section.title(),
                icon: section.icon(),
                complete: snapshot.document.is_complete(section),
                dirty: snapshot.dirty.contains(section),
                saving: snapshot.saving.contains(&section),
            })
            .collect()
    }

    pub fn completed_count(&self) -> usize {
        self.store.completed_count()
    }

    pub fn completion_percentage(&self) -> f64 {
        self.store.completion_percentage()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.store.has_unsaved_changes()
    }

    /// 一括保存する。結果はセクションごとに返す
    pub async fn save_all(&self) -> Result<BulkSaveReport> {
        if self.lifetime.is_closed() {
            debug!("save all on closed overview ignored");
            return Ok(BulkSaveReport::default());
        }
        let token = self.lifetime.token();
        let result = self.store.save_all().await;

        let banner = match &result {
            Ok(report) if report.is_empty() => None,
            Ok(report) if report.is_success() => Some(Banner::success("すべての変更を保存しました")),
            Ok(report) => {
                let failed = report.failed().len();
                let message = report.first_error().unwrap_or("不明なエラー");
                Some(Banner::error(format!(
                    "{}件中{}件を保存しました: {}",
                    report.len(),
                    report.len() - failed,
                    message
                )))
            }
            Err(err) => Some(Banner::error(err.to_string())),
        };
        if let Some(banner) = banner {
            self.show(&token, banner);
        }
        result
    }

    /// 全削除の確認ダイアログを開く
    pub fn open_clear_dialog(&self) {
        let mut dialog = self.clear_dialog.lock();
        if dialog.is_none() {
            *dialog = Some(self.store.request_clear());
        }
    }

    pub fn cancel_clear_dialog(&self) {
        self.clear_dialog.lock().take();
    }

    pub fn is_clear_dialog_open(&self) -> bool {
        self.clear_dialog.lock().is_some()
    }

    /// ダイアログで確定した場合のみ全削除する
    pub async fn confirm_clear(&self) -> Result<ClearOutcome> {
        let Some(request) = self.clear_dialog.lock().take() else {
            debug!("clear confirmed without open dialog");
            return Ok(ClearOutcome::NotRequested);
        };

        let token = self.lifetime.token();
        match self.store.confirm_clear(request).await {
            Ok(()) => {
                self.show(&token, Banner::success("キャンバスを削除しました"));
                Ok(ClearOutcome::Cleared)
            }
            Err(err) => {
                self.show(&token, Banner::error(err.to_string()));
                Err(err)
            }
        }
    }

    fn show(&self, token: &ActivationToken, banner: Banner) {
        if token.is_live() {
            *self.banner.lock() = Some(banner);
        } else {
            debug!("overview closed; banner dropped");
        }
    }

    pub fn banner(&self) -> Option<Banner> {
        self.banner.lock().clone()
    }

    pub fn take_banner(&self) -> Option<Banner> {
        self.banner.lock().take()
    }

    pub fn deactivate(&self) {
        self.lifetime.deactivate();
        self.clear_dialog.lock().take();
    }
}
