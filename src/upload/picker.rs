//! ファイル選択
//!
//! `None` は利用者によるキャンセルを表す。

use crate::error::{CanvasError, Result};
use async_trait::async_trait;
use pitch_canvas_common::PickedFile;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[async_trait]
pub trait FilePicker: Send + Sync {
    async fn pick_files(
        &self,
        allow_multiple: bool,
        allowed_extensions: &[&str],
    ) -> Result<Option<Vec<PickedFile>>>;
}

/// あらかじめ指定されたパスを返すピッカー（CLI引数用）
#[derive(Debug, Clone, Default)]
pub struct PathListPicker {
    paths: Vec<PathBuf>,
}

impl PathListPicker {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

#[async_trait]
impl FilePicker for PathListPicker {
    async fn pick_files(
        &self,
        allow_multiple: bool,
        _allowed_extensions: &[&str],
    ) -> Result<Option<Vec<PickedFile>>> {
        if self.paths.is_empty() {
            return Ok(None);
        }

        let take = if allow_multiple { self.paths.len() } else { 1 };
        let mut files = Vec::with_capacity(take);
        for path in self.paths.iter().take(take) {
            if !path.is_file() {
                return Err(CanvasError::Picker(format!(
                    "ファイルが見つかりません: {}",
                    path.display()
                )));
            }
            files.push(PickedFile::from_path(path.clone()));
        }
        Ok(Some(files))
    }
}

/// フォルダ直下のファイルを返すピッカー
#[derive(Debug, Clone)]
pub struct FolderPicker {
    folder: PathBuf,
}

impl FolderPicker {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }
}

#[async_trait]
impl FilePicker for FolderPicker {
    /// 拡張子による絞り込みは画面側で行うため、ここでは全ファイルを返す
    async fn pick_files(
        &self,
        allow_multiple: bool,
        _allowed_extensions: &[&str],
    ) -> Result<Option<Vec<PickedFile>>> {
        let folder = self.folder.clone();
        let mut files = tokio::task::spawn_blocking(move || scan_folder(&folder))
            .await
            .map_err(|e| CanvasError::Picker(e.to_string()))??;

        if files.is_empty() {
            return Ok(None);
        }
        if !allow_multiple {
            files.truncate(1);
        }
        Ok(Some(files))
    }
}

fn scan_folder(folder: &Path) -> Result<Vec<PickedFile>> {
    if !folder.is_dir() {
        return Err(CanvasError::Picker(format!(
            "フォルダが見つかりません: {}",
            folder.display()
        )));
    }

    let mut files: Vec<PickedFile> = WalkDir::new(folder)
        .max_depth(1) // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| PickedFile::from_path(e.path()))
        .collect();

    // ファイル名でソート
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}
