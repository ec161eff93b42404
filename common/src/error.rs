//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("不明な判定カテゴリ: {0}")]
    UnknownLabel(String),

    /// バックエンド応答から判定結果を読み取れない
    #[error("判定応答エラー: {0}")]
    Response(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unknown_label() {
        let error = Error::UnknownLabel("Rust".to_string());
        assert_eq!(format!("{}", error), "不明な判定カテゴリ: Rust");
    }

    #[test]
    fn test_error_display_response() {
        let error = Error::Response("JSONが見つかりません".to_string());
        let display = format!("{}", error);
        assert!(display.contains("判定応答"));
        assert!(display.contains("JSONが見つかりません"));
    }

    #[test]
    fn test_error_from_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
    }
}
