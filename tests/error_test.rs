//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use pitch_canvas::error::CanvasError;
use pitch_canvas::upload::{FilePicker, FolderPicker, PathListPicker};
use pitch_canvas_common::ALLOWED_EXTENSIONS;
use std::path::PathBuf;

/// 存在しないファイルを指定した場合
#[tokio::test]
async fn test_path_picker_missing_file() {
    let picker = PathListPicker::new(vec![PathBuf::from("/nonexistent/deck.pdf")]);
    let err = picker.pick_files(true, ALLOWED_EXTENSIONS).await.unwrap_err();
    assert!(matches!(err, CanvasError::Picker(_)));
}

/// 存在しないフォルダを指定した場合
#[tokio::test]
async fn test_folder_picker_missing_folder() {
    let picker = FolderPicker::new("/nonexistent/path/12345");
    let err = picker.pick_files(true, ALLOWED_EXTENSIONS).await.unwrap_err();
    assert!(matches!(err, CanvasError::Picker(_)));
}

/// CanvasErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        CanvasError::Config("テスト設定エラー".to_string()),
        CanvasError::EmptyBatch,
        CanvasError::UnsupportedFile("b.exe".to_string()),
        CanvasError::InvalidIndex(3),
        CanvasError::AlreadySubmitted,
        CanvasError::SaveInFlight,
        CanvasError::UnknownSection("pricing".to_string()),
        CanvasError::Submission("提出失敗".to_string()),
        CanvasError::Image("decode".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空: {:?}", err);
    }
}

/// 永続化エラーは文言をそのまま表示する
#[test]
fn test_persistence_error_is_verbatim() {
    let err = CanvasError::Persistence("quota exceeded".to_string());
    assert_eq!(err.to_string(), "quota exceeded");
    assert!(!err.is_validation());
}

/// 入力検証エラーの分類
#[test]
fn test_validation_classification() {
    assert!(CanvasError::EmptyBatch.is_validation());
    assert!(CanvasError::UnsupportedFile("x.exe".into()).is_validation());
    assert!(CanvasError::UploadInFlight.is_validation());
    assert!(!CanvasError::Submission("x".into()).is_validation());
    assert!(!CanvasError::Thumbnail("x".into()).is_validation());
}

/// 共通クレートのエラーを変換できる
#[test]
fn test_common_error_conversion() {
    let err: CanvasError = pitch_canvas_common::Error::UnknownSection("pricing".into()).into();
    assert!(err.to_string().contains("pricing"));
}

/// JSONエラーの変換
#[test]
fn test_json_parse_error() {
    let result: Result<serde_json::Value, _> = serde_json::from_str("{ invalid }");
    let err: CanvasError = result.unwrap_err().into();
    assert!(matches!(err, CanvasError::JsonParse(_)));
}
