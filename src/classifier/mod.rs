//! 判定バックエンド
//!
//! - `Classifier`: 画像1枚を非同期に判定する境界
//! - `SimulatedClassifier`: 擬似モデル（デフォルト）
//! - `CommandClassifier`: AI CLI（claude/codex/gemini）をサブプロセスで呼ぶ
//! - `WithTimeout`: 1回の呼び出しに上限時間を設けるラッパー

mod command;
mod simulated;

pub use command::CommandClassifier;
pub use simulated::SimulatedClassifier;

use crate::ai_provider::AiProvider;
use crate::config::Config;
use crate::error::{Result, SentinelError};
use crate::ledger::ImageData;
use leaf_sentinel_common::Prediction;
use std::future::Future;
use std::time::Duration;

/// 画像判定の境界
///
/// 同時に複数回呼ばれてよい。完了順は呼び出し順と一致しない。
/// 失敗は必ず `Err` で返し、呼び出しを黙って落とさない。
pub trait Classifier: Send + Sync + 'static {
    fn classify(&self, image: ImageData) -> impl Future<Output = Result<Prediction>> + Send;
}

/// 呼び出しごとのタイムアウト
pub struct WithTimeout<C> {
    inner: C,
    limit: Duration,
}

impl<C: Classifier> WithTimeout<C> {
    pub fn new(inner: C, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

impl<C: Classifier> Classifier for WithTimeout<C> {
    fn classify(&self, image: ImageData) -> impl Future<Output = Result<Prediction>> + Send {
        let limit = self.limit;
        let call = self.inner.classify(image);
        async move {
            match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(SentinelError::Timeout(limit.as_secs())),
            }
        }
    }
}

/// 設定とプロバイダから選ばれたバックエンド
pub enum Backend {
    Simulated(SimulatedClassifier),
    Command(CommandClassifier),
}

impl Classifier for Backend {
    fn classify(&self, image: ImageData) -> impl Future<Output = Result<Prediction>> + Send {
        async move {
            match self {
                Backend::Simulated(c) => c.classify(image).await,
                Backend::Command(c) => c.classify(image).await,
            }
        }
    }
}

/// プロバイダに対応するバックエンドをタイムアウト付きで構築
pub fn build(provider: AiProvider, config: &Config) -> Result<WithTimeout<Backend>> {
    let backend = match provider.command_name() {
        None => {
            let (min, max) = config.simulated_latency_ms;
            Backend::Simulated(SimulatedClassifier::new(
                Duration::from_millis(min),
                Duration::from_millis(max),
            ))
        }
        Some(_) => Backend::Command(CommandClassifier::new(provider, config.model.clone())?),
    };
    Ok(WithTimeout::new(backend, config.timeout()))
}
