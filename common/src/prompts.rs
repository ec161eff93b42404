//! プロンプト生成モジュール
//!
//! AI CLIバックエンドに渡す葉病害判定プロンプト

use crate::types::Label;

/// 判定プロンプト生成
///
/// # Arguments
/// * `image_path` - AIに読ませる画像ファイルのパス
///
/// # Returns
/// 1枚判定用のプロンプト文字列
pub fn build_classify_prompt(image_path: &str) -> String {
    let categories = Label::ALL
        .iter()
        .map(|l| l.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Read the image file {image_path} and classify the durian leaf.

あなたはドリアンの葉の病害を診断する植物病理の専門家です。画像の葉を1つのカテゴリに分類してください。

## カテゴリ
以下から最も適切なものを1つ選択：
{categories}

## 強調位置
病変が最も顕著な位置を、画像の左上を(0,0)、右下を(100,100)とした%座標で答えてください。
Healthy の場合は {{"x": 50, "y": 50}} としてください。

## 出力形式（厳密にこのJSON形式のみ出力）
{{
  "label": "カテゴリから選択",
  "confidence": 0.0〜1.0の確信度,
  "focusPoint": {{"x": 0〜100, "y": 0〜100}}
}}"#
    )
}
