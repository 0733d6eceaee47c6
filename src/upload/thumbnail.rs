//! サムネイル生成
//!
//! PDFは1ページ目を、動画は1秒時点のフレームを画像化する。
//! 生成に失敗しても汎用アイコンで代替し、ファイルの受付には影響させない。

use crate::error::{CanvasError, Result};
use anyhow::Context;
use async_trait::async_trait;
use pitch_canvas_common::{FileKind, PickedFile, Thumbnail};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

#[async_trait]
pub trait Thumbnailer: Send + Sync {
    async fn render_pdf_preview(&self, path: &Path) -> Result<PathBuf>;

    async fn render_video_frame(&self, path: &Path) -> Result<PathBuf>;
}

/// 種別に応じてサムネイルを生成する。失敗時はプレースホルダ
pub async fn generate_thumbnail(
    thumbnailer: &dyn Thumbnailer,
    file: &PickedFile,
    kind: FileKind,
) -> Thumbnail {
    let rendered = match kind {
        FileKind::Pdf => thumbnailer.render_pdf_preview(&file.path).await,
        FileKind::Video => thumbnailer.render_video_frame(&file.path).await,
    };

    match rendered {
        Ok(path) => Thumbnail::Rendered(path),
        Err(err) => {
            debug!(file = %file.name, error = %err, "thumbnail fallback to placeholder");
            Thumbnail::Placeholder(kind)
        }
    }
}

/// pdftoppm / ffmpeg を呼び出してサムネイルを作る
#[derive(Debug, Clone)]
pub struct ExternalThumbnailer {
    pdftoppm: String,
    ffmpeg: String,
    output_dir: PathBuf,
    max_width: u32,
    max_height: u32,
}

impl ExternalThumbnailer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            pdftoppm: "pdftoppm".into(),
            ffmpeg: "ffmpeg".into(),
            output_dir: output_dir.into(),
            max_width: 220,
            max_height: 160,
        }
    }

    pub fn with_binaries(mut self, pdftoppm: impl Into<String>, ffmpeg: impl Into<String>) -> Self {
        self.pdftoppm = pdftoppm.into();
        self.ffmpeg = ffmpeg.into();
        self
    }

    pub fn with_size(mut self, max_width: u32, max_height: u32) -> Self {
        self.max_width = max_width;
        self.max_height = max_height;
        self
    }

    /// 入力パスごとに一意な出力名（拡張子なし）
    fn output_name(input: &Path) -> String {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string());
        let digest = Sha256::digest(input.to_string_lossy().as_bytes());
        format!("{}-{}", stem, &hex::encode(digest)[..12])
    }

    /// pdftoppm に渡す出力ルートと、生成される PNG のパス
    ///
    /// 名前中の `.` を拡張子として扱わないよう、`.png` は文字列で付ける。
    fn output_paths(&self, input: &Path) -> (PathBuf, PathBuf) {
        let name = Self::output_name(input);
        (
            self.output_dir.join(&name),
            self.output_dir.join(format!("{}.png", name)),
        )
    }

    async fn prepare(&self) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("create {}", self.output_dir.display()))
    }

    async fn run(program: &str, args: &[&str]) -> anyhow::Result<()> {
        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .with_context(|| format!("{} の実行に失敗", program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "{} failed (exit code: {:?}): {}",
                program,
                output.status.code(),
                stderr.trim()
            );
        }
        Ok(())
    }

    /// 表示サイズに縮小して上書きする
    async fn shrink(&self, image_path: PathBuf) -> anyhow::Result<PathBuf> {
        let (width, height) = (self.max_width, self.max_height);
        tokio::task::spawn_blocking(move || -> anyhow::Result<PathBuf> {
            let image = image::open(&image_path)
                .with_context(|| format!("decode {}", image_path.display()))?;
            image
                .thumbnail(width, height)
                .save(&image_path)
                .with_context(|| format!("write {}", image_path.display()))?;
            Ok(image_path)
        })
        .await?
    }

    async fn render_pdf(&self, path: &Path) -> anyhow::Result<PathBuf> {
        self.prepare().await?;
        let (root, target) = self.output_paths(path);
        let input = path.to_string_lossy();
        let output = root.to_string_lossy();
        Self::run(
            &self.pdftoppm,
            &["-png", "-f", "1", "-l", "1", "-singlefile", &input, &output],
        )
        .await?;
        self.shrink(target).await
    }

    async fn render_video(&self, path: &Path) -> anyhow::Result<PathBuf> {
        self.prepare().await?;
        let (_, target) = self.output_paths(path);
        let input = path.to_string_lossy();
        let output = target.to_string_lossy();
        Self::run(
            &self.ffmpeg,
            &[
                "-y", "-loglevel", "error", "-ss", "1", "-i", &input, "-frames:v", "1", &output,
            ],
        )
        .await?;
        self.shrink(target).await
    }
}

#[async_trait]
impl Thumbnailer for ExternalThumbnailer {
    async fn render_pdf_preview(&self, path: &Path) -> Result<PathBuf> {
        self.render_pdf(path)
            .await
            .map_err(|e| CanvasError::Thumbnail(format!("{e:#}")))
    }

    async fn render_video_frame(&self, path: &Path) -> Result<PathBuf> {
        self.render_video(path)
            .await
            .map_err(|e| CanvasError::Thumbnail(format!("{e:#}")))
    }
}
