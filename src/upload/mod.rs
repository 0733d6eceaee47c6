pub mod picker;
mod screen;
pub mod submission;
pub mod thumbnail;

pub use picker::{FilePicker, FolderPicker, PathListPicker};
pub use screen::{PickResult, PitchDeckScreen};
pub use submission::{DeckSubmitter, DirectorySubmitter, SubmissionManifest, SubmissionReceipt};
pub use thumbnail::{generate_thumbnail, ExternalThumbnailer, Thumbnailer};
