//! 判定結果の型定義
//!
//! CLIとバックエンドで共有される型:
//! - Label: 葉の判定カテゴリ（5分類）
//! - FocusPoint: 病変の強調位置（画像に対する%座標）
//! - Prediction: 1枚の画像に対する判定結果

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 判定カテゴリ
///
/// 宣言順は表示順（集計テーブルの並び）を兼ねる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Label {
    Healthy,
    Anthracnose,
    LeafBlight,
    SootyMold,
    Dieback,
}

impl Label {
    /// 全カテゴリ（表示順）
    pub const ALL: [Label; 5] = [
        Label::Healthy,
        Label::Anthracnose,
        Label::LeafBlight,
        Label::SootyMold,
        Label::Dieback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Healthy => "Healthy",
            Label::Anthracnose => "Anthracnose",
            Label::LeafBlight => "Leaf Blight",
            Label::SootyMold => "Sooty Mold",
            Label::Dieback => "Dieback",
        }
    }

    /// 健全葉か（健全葉では強調位置を表示しない）
    pub fn is_healthy(&self) -> bool {
        matches!(self, Label::Healthy)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = Error;

    /// 大文字小文字・空白・区切り記号の揺れを吸収して解釈する
    /// （"Leaf Blight" / "leaf_blight" / "LEAF-BLIGHT" はすべて LeafBlight）
    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "healthy" => Ok(Label::Healthy),
            "anthracnose" => Ok(Label::Anthracnose),
            "leafblight" => Ok(Label::LeafBlight),
            "sootymold" | "sootymould" => Ok(Label::SootyMold),
            "dieback" => Ok(Label::Dieback),
            _ => Err(Error::UnknownLabel(s.to_string())),
        }
    }
}

impl TryFrom<String> for Label {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.as_str().to_string()
    }
}

/// 病変の強調位置（x, y とも 0〜100 の%座標）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusPoint {
    pub x: f64,
    pub y: f64,
}

impl FocusPoint {
    pub const CENTER: FocusPoint = FocusPoint { x: 50.0, y: 50.0 };

    /// 範囲外・非有限値を [0, 100] に丸める
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: clamp_finite(x, 0.0, 100.0),
            y: clamp_finite(y, 0.0, 100.0),
        }
    }
}

impl Default for FocusPoint {
    fn default() -> Self {
        Self::CENTER
    }
}

/// 判定結果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub label: Label,

    /// 確信度 [0, 1]
    pub confidence: f64,

    /// 推論時間（表示用のみ）
    #[serde(default, alias = "inferenceTime")]
    pub latency_ms: u64,

    #[serde(default, alias = "heatmapPosition")]
    pub focus_point: FocusPoint,
}

impl Prediction {
    pub fn new(label: Label, confidence: f64, latency_ms: u64, focus_point: FocusPoint) -> Self {
        Self {
            label,
            confidence: clamp_finite(confidence, 0.0, 1.0),
            latency_ms,
            focus_point: FocusPoint::new(focus_point.x, focus_point.y),
        }
    }

    /// 強調位置（健全葉ではNone）
    pub fn focus(&self) -> Option<FocusPoint> {
        if self.label.is_healthy() {
            None
        } else {
            Some(self.focus_point)
        }
    }

    pub fn confidence_percent(&self) -> f64 {
        self.confidence * 100.0
    }
}

fn clamp_finite(value: f64, min: f64, max: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        min
    }
}
