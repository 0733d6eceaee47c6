use thiserror::Error;

#[derive(Error, Debug)]
pub enum CanvasError {
    #[error("設定エラー: {0}")]
    Config(String),

    /// 永続化先から返されたメッセージをそのまま表示する
    #[error("{0}")]
    Persistence(String),

    #[error("提出するファイルがありません。ファイルを追加してください")]
    EmptyBatch,

    #[error("対応していないファイル形式です: {0}")]
    UnsupportedFile(String),

    #[error("指定した番号のファイルはありません: {0}")]
    InvalidIndex(usize),

    #[error("ピッチデッキは提出済みです")]
    AlreadySubmitted,

    #[error("提出処理中です")]
    SubmissionInFlight,

    #[error("アップロード処理中です")]
    UploadInFlight,

    #[error("保存処理中です。完了してから再度実行してください")]
    SaveInFlight,

    #[error("不明なセクション: {0}")]
    UnknownSection(String),

    #[error("ファイル選択エラー: {0}")]
    Picker(String),

    #[error("提出エラー: {0}")]
    Submission(String),

    #[error("サムネイル生成エラー: {0}")]
    Thumbnail(String),

    #[error("画像処理エラー: {0}")]
    Image(String),

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] pitch_canvas_common::Error),
}

impl CanvasError {
    /// 入力検証エラー（ログ対象外・再試行なし）かどうか
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CanvasError::EmptyBatch
                | CanvasError::UnsupportedFile(_)
                | CanvasError::InvalidIndex(_)
                | CanvasError::AlreadySubmitted
                | CanvasError::SubmissionInFlight
                | CanvasError::UploadInFlight
                | CanvasError::SaveInFlight
                | CanvasError::UnknownSection(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CanvasError>;
