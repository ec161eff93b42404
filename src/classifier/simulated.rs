//! 擬似判定モデル
//!
//! 実際の推論は行わない。カテゴリは画像内容のハッシュで決まり（同じ画像は
//! 同じカテゴリ）、確信度・強調位置・遅延は呼び出しごとに揺らぐ。
//!
//! - 遅延: 設定範囲（既定 50〜250ms）
//! - 確信度: 0.85〜0.99（小数3桁）
//! - 強調位置: x, y とも 30〜70%

use super::Classifier;
use crate::error::{Result, SentinelError};
use crate::ledger::ImageData;
use leaf_sentinel_common::{FocusPoint, Label, Prediction};
use sha2::{Digest, Sha256};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub struct SimulatedClassifier {
    min_latency: Duration,
    max_latency: Duration,
    calls: AtomicU64,
}

impl SimulatedClassifier {
    pub fn new(min_latency: Duration, max_latency: Duration) -> Self {
        Self {
            min_latency: min_latency.min(max_latency),
            max_latency: max_latency.max(min_latency),
            calls: AtomicU64::new(0),
        }
    }

    /// これまでの呼び出し回数
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    fn predict(&self, image: &ImageData, call: u64) -> (Prediction, Duration) {
        let label_digest = Sha256::digest(image.bytes());
        let label = Label::ALL[label_digest[0] as usize % Label::ALL.len()];

        let jitter = Sha256::new()
            .chain_update(label_digest)
            .chain_update(call.to_le_bytes())
            .finalize();

        let span = self.max_latency.saturating_sub(self.min_latency);
        let latency = self.min_latency + span.mul_f64(unit(&jitter[0..4]));
        let confidence = ((0.85 + unit(&jitter[4..8]) * 0.14) * 1000.0).round() / 1000.0;
        let focus = FocusPoint::new(
            30.0 + unit(&jitter[8..12]) * 40.0,
            30.0 + unit(&jitter[12..16]) * 40.0,
        );

        let prediction = Prediction::new(label, confidence, latency.as_millis() as u64, focus);
        (prediction, latency)
    }
}

impl Default for SimulatedClassifier {
    fn default() -> Self {
        Self::new(Duration::from_millis(50), Duration::from_millis(250))
    }
}

impl Classifier for SimulatedClassifier {
    fn classify(&self, image: ImageData) -> impl Future<Output = Result<Prediction>> + Send {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        let planned = if image.is_empty() {
            None
        } else {
            Some(self.predict(&image, call))
        };

        async move {
            let (prediction, latency) = planned.ok_or_else(|| {
                SentinelError::ClassificationFailed(format!("空の画像です: {}", image.name()))
            })?;
            tokio::time::sleep(latency).await;
            Ok(prediction)
        }
    }
}

/// 4バイトを [0, 1) の実数に写す
fn unit(bytes: &[u8]) -> f64 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf) as f64 / (u32::MAX as f64 + 1.0)
}
