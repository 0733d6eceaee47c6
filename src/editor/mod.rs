//! セクション編集画面
//!
//! 1つのテキスト欄をキャンバスの1セクションに結びつける。
//! 生成時に現在値を読み込むため、入力より先に必ず読み込みが行われる。

mod overview;

pub use overview::{CanvasOverview, ClearOutcome, SectionRow};

use crate::banner::Banner;
use crate::error::Result;
use crate::lifecycle::ScreenLifetime;
use crate::store::{CanvasEvent, CanvasStore, SaveOutcome, SkipReason};
use parking_lot::Mutex;
use pitch_canvas_common::Section;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::debug;

#[derive(Debug, Default)]
struct EditorView {
    buffer: String,
    has_focus: bool,
    banner: Option<Banner>,
}

pub struct FieldEditor {
    section: Section,
    store: Arc<CanvasStore>,
    lifetime: ScreenLifetime,
    view: Mutex<EditorView>,
    events: Mutex<Option<broadcast::Receiver<CanvasEvent>>>,
}

impl FieldEditor {
    /// 画面を開く。購読してから現在値を読み込む
    pub fn activate(store: Arc<CanvasStore>, section: Section) -> Self {
        let events = store.subscribe();
        let buffer = store.value(section);
        Self {
            section,
            store,
            lifetime: ScreenLifetime::new(),
            view: Mutex::new(EditorView {
                buffer,
                ..Default::default()
            }),
            events: Mutex::new(Some(events)),
        }
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn title(&self) -> &'static str {
        self.section.title()
    }

    pub fn hint_text(&self) -> &'static str {
        self.section.hint()
    }

    pub fn text(&self) -> String {
        self.view.lock().buffer.clone()
    }

    pub fn has_focus(&self) -> bool {
        self.view.lock().has_focus
    }

    /// 未入力かつ非フォーカスのときだけヒントを表示
    pub fn hint_visible(&self) -> bool {
        let view = self.view.lock();
        view.buffer.is_empty() && !view.has_focus
    }

    pub fn is_active(&self) -> bool {
        self.events.lock().is_some()
    }

    pub fn on_edit(&self, text: impl Into<String>) {
        if !self.is_active() {
            debug!(section = self.section.key(), "edit on closed editor ignored");
            return;
        }
        let text = text.into();
        self.view.lock().buffer = text.clone();
        self.store.edit(self.section, text);
    }

    /// フォーカスはヒント表示にのみ影響する
    pub fn on_focus_changed(&self, focused: bool) {
        self.view.lock().has_focus = focused;
    }

    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty(self.section)
    }

    pub fn is_saving(&self) -> bool {
        self.store.is_saving(self.section)
    }

    /// 保存ボタンの有効状態
    pub fn can_save(&self) -> bool {
        self.is_active() && self.store.can_save(self.section)
    }

    /// 保存する。完了時に画面が閉じられていれば表示は更新しない
    pub async fn save(&self) -> Result<SaveOutcome> {
        if !self.is_active() {
            debug!(section = self.section.key(), "save on closed editor ignored");
            return Ok(SaveOutcome::Skipped(SkipReason::Closed));
        }
        let token = self.lifetime.token();
        let result = self.store.save_field(self.section).await;

        if !token.is_live() {
            debug!(section = self.section.key(), "editor closed before save finished");
            return result;
        }

        let banner = match &result {
            Ok(SaveOutcome::Saved) => Some(Banner::success(format!("{}を保存しました", self.title()))),
            Ok(SaveOutcome::Skipped(_)) => None,
            Err(err) => Some(Banner::error(err.to_string())),
        };
        if banner.is_some() {
            self.view.lock().banner = banner;
        }
        result
    }

    /// 状態ホルダからの通知を処理する。処理した件数を返す
    ///
    /// 他の画面で読み込み・全削除が行われた場合は表示中の値を差し替える。
    pub fn sync(&self) -> usize {
        let mut guard = self.events.lock();
        let Some(events) = guard.as_mut() else {
            return 0;
        };

        let mut handled = 0;
        let mut refresh = false;
        loop {
            match events.try_recv() {
                Ok(event) => {
                    handled += 1;
                    match event {
                        CanvasEvent::Loaded | CanvasEvent::Cleared => refresh = true,
                        CanvasEvent::FieldChanged(section) if section == self.section => {
                            refresh = true
                        }
                        _ => {}
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    handled += skipped as usize;
                    refresh = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        drop(guard);

        if refresh {
            let value = self.store.value(self.section);
            let mut view = self.view.lock();
            if view.buffer != value {
                view.buffer = value;
            }
        }
        handled
    }

    pub fn banner(&self) -> Option<Banner> {
        self.view.lock().banner.clone()
    }

    /// バナーを閉じる
    pub fn take_banner(&self) -> Option<Banner> {
        self.view.lock().banner.take()
    }

    /// 画面を閉じる。購読を解除し、実行中の保存は表示を更新しなくなる
    pub fn deactivate(&self) {
        self.lifetime.deactivate();
        self.events.lock().take();
    }
}
