//! Pitch Canvas Common Library
//!
//! CLIと各画面で共有される型とユーティリティ

pub mod section;
pub mod document;
pub mod dirty;
pub mod upload;
pub mod error;

pub use section::Section;
pub use document::CanvasDocument;
pub use dirty::DirtyFieldSet;
pub use upload::{
    partition_allowed, FileKind, PickedFile, Thumbnail, UploadBatch, UploadEntry,
    ALLOWED_EXTENSIONS,
};
pub use error::{Error, Result};
