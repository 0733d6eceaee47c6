//! プロフィール画像のアップロード
//!
//! 選択した画像を中央で正方形に切り抜き、指定サイズのPNGにして保存する。

use crate::error::{CanvasError, Result};
use async_trait::async_trait;
use image::imageops::FilterType;
use image::ImageFormat;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// 受け付ける画像形式
pub const AVATAR_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

const AVATAR_FILE_NAME: &str = "avatar.png";

#[async_trait]
pub trait AvatarStorage: Send + Sync {
    /// PNGデータを保存し、保存先を返す
    async fn store_avatar(&self, png: Vec<u8>) -> Result<String>;
}

/// データディレクトリに avatar.png として保存する
#[derive(Debug, Clone)]
pub struct FileAvatarStorage {
    dir: PathBuf,
}

impl FileAvatarStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl AvatarStorage for FileAvatarStorage {
    async fn store_avatar(&self, png: Vec<u8>) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(AVATAR_FILE_NAME);
        tokio::fs::write(&path, png).await?;
        Ok(path.display().to_string())
    }
}

pub fn is_avatar_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AVATAR_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// 正方形に切り抜いて縮小し、PNGにエンコードする
pub fn prepare_avatar(path: &Path, size: u32) -> Result<Vec<u8>> {
    let image = image::open(path)
        .map_err(|e| CanvasError::Image(format!("{}: {}", path.display(), e)))?;
    let square = image.resize_to_fill(size, size, FilterType::Lanczos3);

    let mut png = Vec::new();
    square
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| CanvasError::Image(e.to_string()))?;
    Ok(png)
}

pub struct AvatarUploader {
    storage: Arc<dyn AvatarStorage>,
    size: u32,
    uploading: AtomicBool,
}

struct UploadingLatch<'a>(&'a AtomicBool);

impl Drop for UploadingLatch<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AvatarUploader {
    pub fn new(storage: Arc<dyn AvatarStorage>, size: u32) -> Self {
        Self {
            storage,
            size,
            uploading: AtomicBool::new(false),
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading.load(Ordering::Acquire)
    }

    pub async fn upload(&self, path: &Path) -> Result<String> {
        if !is_avatar_file(path) {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            return Err(CanvasError::UnsupportedFile(name));
        }
        if self.uploading.swap(true, Ordering::AcqRel) {
            return Err(CanvasError::UploadInFlight);
        }
        let _latch = UploadingLatch(&self.uploading);

        let source = path.to_path_buf();
        let size = self.size;
        let png = tokio::task::spawn_blocking(move || prepare_avatar(&source, size))
            .await
            .map_err(|e| CanvasError::Image(e.to_string()))??;

        let location = self.storage.store_avatar(png).await?;
        info!(location = %location, "avatar uploaded");
        Ok(location)
    }
}
