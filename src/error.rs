use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentinelError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("カメラを利用できません: {0}")]
    DeviceUnavailable(String),

    #[error("判定に失敗しました: {0}")]
    ClassificationFailed(String),

    #[error("判定がタイムアウトしました（{0}秒）")]
    Timeout(u64),

    #[error("台帳タスクが停止しています")]
    LedgerClosed,

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("CLI実行エラー: {0}")]
    CliExecution(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] leaf_sentinel_common::Error),
}

pub type Result<T> = std::result::Result<T, SentinelError>;
