//! 統合テスト用の手動判定器
//!
//! 判定呼び出しを記録だけして保留し、テスト側が任意の順番で結果を返す。

#![allow(dead_code)]

use leaf_sentinel::classifier::Classifier;
use leaf_sentinel::error::{Result, SentinelError};
use leaf_sentinel::ledger::ImageData;
use leaf_sentinel_common::{FocusPoint, Label, Prediction};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

struct PendingCall {
    name: String,
    reply: oneshot::Sender<Result<Prediction>>,
}

#[derive(Default)]
pub struct ManualClassifier {
    pending: Mutex<Vec<PendingCall>>,
    issued: Mutex<Vec<String>>,
}

impl ManualClassifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// これまでに呼ばれた画像名（呼び出し順）
    pub fn issued(&self) -> Vec<String> {
        self.issued.lock().unwrap().clone()
    }

    /// 結果待ちの呼び出し数
    pub fn outstanding(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// 指定画像の呼び出しに結果を返す
    pub fn resolve(&self, name: &str, result: Result<Prediction>) {
        let call = {
            let mut pending = self.pending.lock().unwrap();
            let pos = pending
                .iter()
                .position(|c| c.name == name)
                .unwrap_or_else(|| panic!("{} の呼び出しがありません", name));
            pending.remove(pos)
        };
        let _ = call.reply.send(result);
    }

    /// 最も古い呼び出しに結果を返す
    pub fn resolve_oldest(&self, result: Result<Prediction>) {
        let call = self.pending.lock().unwrap().remove(0);
        let _ = call.reply.send(result);
    }

    /// 結果待ちが `count` 件になるまで他のタスクを進める
    pub async fn wait_outstanding(&self, count: usize) {
        for _ in 0..1000 {
            if self.outstanding() >= count {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("呼び出しが{}件に達しません（現在{}件）", count, self.outstanding());
    }
}

impl Classifier for ManualClassifier {
    fn classify(&self, image: ImageData) -> impl Future<Output = Result<Prediction>> + Send {
        let (reply, rx) = oneshot::channel();
        let name = image.name().to_string();
        self.issued.lock().unwrap().push(name.clone());
        self.pending.lock().unwrap().push(PendingCall { name, reply });

        async move {
            rx.await
                .unwrap_or_else(|_| Err(SentinelError::ClassificationFailed("応答なし".into())))
        }
    }
}

pub fn prediction(label: Label, confidence: f64) -> Prediction {
    Prediction::new(label, confidence, 120, FocusPoint::new(40.0, 60.0))
}

pub fn leaf(name: &str) -> ImageData {
    ImageData::new(name, name.as_bytes().to_vec())
}

/// 他のタスクを一通り進める
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}
