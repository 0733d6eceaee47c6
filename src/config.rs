use crate::error::{CanvasError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub startup_id: String,
    pub data_dir: Option<PathBuf>,
    pub submission_dir: Option<PathBuf>,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    pub avatar_size: u32,
    pub pdftoppm_bin: String,
    pub ffmpeg_bin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            startup_id: "default".into(),
            data_dir: None,
            submission_dir: None,
            thumbnail_width: 220,
            thumbnail_height: 160,
            avatar_size: 256,
            pdftoppm_bin: "pdftoppm".into(),
            ffmpeg_bin: "ffmpeg".into(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            serde_json::from_str(&content)?
        } else {
            Self::default()
        };

        Ok(config.with_env_overrides())
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CanvasError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("pitch-canvas").join("config.json"))
    }

    /// 環境変数を優先
    fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("PITCH_CANVAS_DATA_DIR") {
            if !dir.trim().is_empty() {
                self.data_dir = Some(PathBuf::from(dir));
            }
        }
        if let Ok(id) = std::env::var("PITCH_CANVAS_STARTUP_ID") {
            if !id.trim().is_empty() {
                self.startup_id = id;
            }
        }
        self
    }

    /// キャンバス・アバターの保存先
    pub fn resolved_data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let base = dirs::data_dir()
            .ok_or_else(|| CanvasError::Config("データディレクトリが見つかりません".into()))?;
        Ok(base.join("pitch-canvas"))
    }

    /// 提出先（未設定ならデータディレクトリ配下）
    pub fn resolved_submission_dir(&self) -> Result<PathBuf> {
        match &self.submission_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(self.resolved_data_dir()?.join("submissions")),
        }
    }

    pub fn thumbnail_cache_dir(&self) -> Result<PathBuf> {
        Ok(self.resolved_data_dir()?.join("thumbnails"))
    }

    pub fn set_startup_id(&mut self, id: String) -> Result<()> {
        if id.trim().is_empty() {
            return Err(CanvasError::Config("startup_id が空です".into()));
        }
        self.startup_id = id;
        self.save()
    }
}
