//! pitch-canvas: スタートアップ資金調達向けビジネスモデルキャンバス編集ツール
//!
//! 9セクションのキャンバス編集・保存と、ピッチデッキの提出を扱う。

pub mod banner;
pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod profile;
pub mod session;
pub mod store;
pub mod upload;

pub use pitch_canvas_common::{CanvasDocument, Section};
