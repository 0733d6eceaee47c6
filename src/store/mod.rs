mod canvas;
pub mod persistence;

pub use canvas::{
    BulkSaveReport, CanvasEvent, CanvasSnapshot, CanvasStore, ClearRequest, SaveOutcome,
    SkipReason,
};
pub use persistence::{
    CanvasPersistence, FieldResults, JsonFileBackend, PersistResult, PersistenceError,
};
