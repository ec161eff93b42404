//! APIレスポンスパーサー
//!
//! AI CLIのレスポンスからJSONを抽出し、判定結果をパースする

use crate::error::{Error, Result};
use crate::types::{FocusPoint, Label, Prediction};
use serde::Deserialize;

/// APIレスポンスからJSON部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 生の {...} オブジェクト / [...] 配列（先に現れた方）
/// 3. エラー
///
/// # Examples
/// ```
/// use leaf_sentinel_common::extract_json;
///
/// let response = "result: {\"label\": \"Healthy\"} done";
/// let json = extract_json(response).unwrap();
/// assert_eq!(json, "{\"label\": \"Healthy\"}");
/// ```
pub fn extract_json(response: &str) -> Result<&str> {
    // ```json ... ``` ブロックを探す
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + 7; // "```json" の長さ
        if let Some(end_offset) = response[start..].find("```") {
            let end = start + end_offset;
            return Ok(response[start..end].trim());
        }
    }

    // 先に現れた方の括弧を採用する
    if let Some(start) = response.find(|c: char| c == '{' || c == '[') {
        let close = if response[start..].starts_with('{') { '}' } else { ']' };
        if let Some(end) = response.rfind(close) {
            if end >= start {
                return Ok(&response[start..=end]);
            }
        }
    }

    Err(Error::Response("JSONが見つかりません".into()))
}

/// AIが返す判定JSON（表記揺れを許容する）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPrediction {
    label: String,
    #[serde(default)]
    confidence: f64,
    #[serde(default, alias = "inferenceTime")]
    latency_ms: Option<u64>,
    #[serde(default, alias = "heatmapPosition")]
    focus_point: Option<FocusPoint>,
}

/// 判定レスポンスをパース
///
/// - 配列で返ってきた場合は先頭要素を採用
/// - 確信度が 1 を超える場合は百分率とみなして 100 で割る
/// - 推論時間が無い場合は `measured_latency_ms` を使う
pub fn parse_prediction_response(response: &str, measured_latency_ms: u64) -> Result<Prediction> {
    let json_str = extract_json(response)?;
    let value: serde_json::Value = serde_json::from_str(json_str.trim())
        .map_err(|e| Error::Response(format!("判定JSONパースエラー: {}", e)))?;

    let value = match value {
        serde_json::Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
        serde_json::Value::Array(_) => return Err(Error::Response("判定結果が空です".into())),
        other => other,
    };

    let raw: RawPrediction = serde_json::from_value(value)
        .map_err(|e| Error::Response(format!("判定JSONパースエラー: {}", e)))?;

    let label: Label = raw.label.parse()?;
    let confidence = if raw.confidence > 1.0 {
        raw.confidence / 100.0
    } else {
        raw.confidence
    };

    Ok(Prediction::new(
        label,
        confidence,
        raw.latency_ms.unwrap_or(measured_latency_ms),
        raw.focus_point.unwrap_or_default(),
    ))
}
