//! ピッチデッキのアップロード型定義
//!
//! - FileKind: 受け付けるファイル種別（PDF/動画）
//! - UploadEntry: ファイルとサムネイルの組
//! - UploadBatch: 提出単位のバッチ

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 受け付ける拡張子（小文字）
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "mp4", "avi", "mov", "mkv", "wmv"];

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "wmv"];

/// ファイル種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Video,
}

impl FileKind {
    /// 拡張子から判定（大文字小文字を無視）
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_lowercase();
        if ext == "pdf" {
            Some(FileKind::Pdf)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(FileKind::Video)
        } else {
            None
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// サムネイル生成失敗時のアイコン識別子
    pub fn placeholder_icon(&self) -> &'static str {
        match self {
            FileKind::Pdf => "picture_as_pdf",
            FileKind::Video => "video_file",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Video => "video",
        }
    }
}

/// ファイルピッカーが返すファイル
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickedFile {
    pub name: String,
    pub path: PathBuf,
}

impl PickedFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// パスのファイル名を表示名にする
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self { name, path }
    }

    /// 表示名の拡張子で判定する
    pub fn kind(&self) -> Option<FileKind> {
        FileKind::from_path(Path::new(&self.name))
    }
}

/// 許可リストで受付/拒否に振り分ける（順序は維持）
pub fn partition_allowed(files: Vec<PickedFile>) -> (Vec<PickedFile>, Vec<PickedFile>) {
    files.into_iter().partition(|f| f.kind().is_some())
}

/// プレビュー画像
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum Thumbnail {
    /// 生成済み画像のパス
    Rendered(PathBuf),
    /// 生成失敗時の汎用アイコン
    Placeholder(FileKind),
}

impl Thumbnail {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Thumbnail::Placeholder(_))
    }
}

/// ファイルとサムネイルの組
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadEntry {
    pub file: PickedFile,
    pub kind: FileKind,
    pub thumbnail: Thumbnail,
}

/// 提出単位のバッチ
///
/// ファイルとサムネイルは同じ要素に格納されるため、
/// 両者の長さと添字は常に一致する。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadBatch {
    entries: Vec<UploadEntry>,
    submitted: bool,
    submitted_at: Option<DateTime<Utc>>,
}

impl UploadBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: UploadEntry) {
        self.entries.push(entry);
    }

    /// 添字の要素を削除。範囲外ならNone
    pub fn remove(&mut self, index: usize) -> Option<UploadEntry> {
        if index < self.entries.len() {
            Some(self.entries.remove(index))
        } else {
            None
        }
    }

    pub fn entries(&self) -> &[UploadEntry] {
        &self.entries
    }

    pub fn files(&self) -> impl Iterator<Item = &PickedFile> + '_ {
        self.entries.iter().map(|e| &e.file)
    }

    pub fn thumbnails(&self) -> impl Iterator<Item = &Thumbnail> + '_ {
        self.entries.iter().map(|e| &e.thumbnail)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    /// 提出済みにする。一度だけ成功し、日時は上書きしない
    pub fn mark_submitted(&mut self, at: DateTime<Utc>) -> bool {
        if self.submitted {
            return false;
        }
        self.submitted = true;
        self.submitted_at = Some(at);
        true
    }
}
