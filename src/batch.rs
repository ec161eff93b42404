//! 一括判定
//!
//! 台帳で判定待ちのアイテムをその時点で選び出し、1件ずつ並行に判定して
//! 結果をIDで台帳に書き戻す。

use crate::classifier::Classifier;
use crate::error::{Result, SentinelError};
use crate::ledger::{Completion, ItemId, LedgerHandle, Outcome};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// `submit_pending` 1回分の集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub selected: usize,
    pub classified: usize,
    pub failed: usize,
    /// 台帳から消えていて反映されなかった件数
    pub discarded: usize,
}

type InFlightSet = Arc<Mutex<HashSet<ItemId>>>;

/// 判定中IDの登録を、タスク終了時（失敗・中断含む）に必ず外す
struct InFlightGuard {
    set: InFlightSet,
    id: ItemId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.set).remove(&self.id);
    }
}

pub struct BatchOrchestrator<C> {
    ledger: LedgerHandle,
    classifier: Arc<C>,
    in_flight: InFlightSet,
}

impl<C> Clone for BatchOrchestrator<C> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            classifier: self.classifier.clone(),
            in_flight: self.in_flight.clone(),
        }
    }
}

impl<C: Classifier> BatchOrchestrator<C> {
    pub fn new(ledger: LedgerHandle, classifier: Arc<C>) -> Self {
        Self {
            ledger,
            classifier,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn ledger(&self) -> &LedgerHandle {
        &self.ledger
    }

    /// 判定中のアイテムが1件でもあるか
    pub fn is_busy(&self) -> bool {
        !lock(&self.in_flight).is_empty()
    }

    pub fn in_flight(&self) -> usize {
        lock(&self.in_flight).len()
    }

    /// 判定待ちのアイテムをすべて判定する
    ///
    /// 選択は呼び出し時点の台帳に対して行い、別の呼び出しで判定中または
    /// 判定済みのアイテムは選ばない。発行した判定がすべて終わるまで戻らない。
    /// 個々の判定失敗は `Failed` として台帳に記録し、他の判定は止めない。
    pub async fn submit_pending(&self) -> Result<BatchReport> {
        // 選択と払い出しは台帳タスク側で一度に行う
        let claimed = self.ledger.claim_pending().await?;

        let selected: Vec<_> = {
            let mut in_flight = lock(&self.in_flight);
            claimed
                .into_iter()
                .filter(|item| in_flight.insert(item.id))
                .map(|item| {
                    let guard = InFlightGuard {
                        set: self.in_flight.clone(),
                        id: item.id,
                    };
                    (item, guard)
                })
                .collect()
        };

        let mut report = BatchReport {
            selected: selected.len(),
            ..Default::default()
        };
        if selected.is_empty() {
            tracing::debug!("判定待ちのアイテムなし");
            return Ok(report);
        }
        tracing::info!(count = report.selected, "一括判定開始");

        let tasks: Vec<_> = selected
            .into_iter()
            .map(|(item, guard)| {
                let ledger = self.ledger.clone();
                let classifier = self.classifier.clone();
                let id = item.id;
                let handle = tokio::spawn(async move {
                    let _guard = guard;
                    let result = classifier.classify(item.image).await;
                    if let Err(e) = &result {
                        tracing::warn!(item = %id, error = %e, "判定失敗");
                    }
                    let outcome = Outcome::from(result);
                    let failed = matches!(outcome, Outcome::Failed(_));
                    let completion = ledger.complete(id, outcome).await?;
                    Ok::<_, SentinelError>((failed, completion))
                });
                (id, handle)
            })
            .collect();

        for (id, handle) in tasks {
            match handle.await {
                Ok(Ok((failed, completion))) => report.record(failed, completion),
                Ok(Err(e)) => return Err(e),
                Err(e) => {
                    // 判定タスク自体が落ちた場合も判定待ちのまま残さない
                    tracing::warn!(item = %id, error = %e, "判定タスク異常終了");
                    let completion = self
                        .ledger
                        .complete(id, Outcome::Failed(format!("判定タスク異常終了: {}", e)))
                        .await?;
                    report.record(true, completion);
                }
            }
        }

        tracing::info!(
            classified = report.classified,
            failed = report.failed,
            discarded = report.discarded,
            "一括判定完了"
        );
        Ok(report)
    }
}

impl BatchReport {
    fn record(&mut self, failed: bool, completion: Completion) {
        match completion {
            Completion::Applied if failed => self.failed += 1,
            Completion::Applied => self.classified += 1,
            Completion::AlreadySettled | Completion::UnknownItem => self.discarded += 1,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::SimulatedClassifier;
    use crate::ledger::{ImageData, ItemStatus};
    use std::time::Duration;

    fn simulated() -> Arc<SimulatedClassifier> {
        Arc::new(SimulatedClassifier::new(
            Duration::from_millis(10),
            Duration::from_millis(50),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_pending_completes_all() {
        let ledger = LedgerHandle::spawn();
        for i in 0..4u8 {
            ledger.create(ImageData::new(format!("{}.jpg", i), vec![i, 7, 7])).await.unwrap();
        }

        let orchestrator = BatchOrchestrator::new(ledger.clone(), simulated());
        let report = orchestrator.submit_pending().await.unwrap();

        assert_eq!(report.selected, 4);
        assert_eq!(report.classified, 4);
        assert!(!orchestrator.is_busy());
        assert!(!ledger.view().progress.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_image_recorded_as_failed() {
        let ledger = LedgerHandle::spawn();
        let good = ledger.create(ImageData::new("good.jpg", vec![1, 2])).await.unwrap();
        let bad = ledger.create(ImageData::new("bad.jpg", Vec::<u8>::new())).await.unwrap();

        let orchestrator = BatchOrchestrator::new(ledger.clone(), simulated());
        let report = orchestrator.submit_pending().await.unwrap();
        assert_eq!(report.classified, 1);
        assert_eq!(report.failed, 1);

        let items = ledger.snapshot().await.unwrap();
        let status = |id| items.iter().find(|i| i.id == id).map(|i| i.status.clone());
        assert!(matches!(status(good), Some(ItemStatus::Completed { .. })));
        assert!(matches!(status(bad), Some(ItemStatus::Failed { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_items_not_reselected() {
        let ledger = LedgerHandle::spawn();
        ledger.create(ImageData::new("a.jpg", vec![1])).await.unwrap();

        let classifier = simulated();
        let orchestrator = BatchOrchestrator::new(ledger.clone(), classifier.clone());
        orchestrator.submit_pending().await.unwrap();
        let second = orchestrator.submit_pending().await.unwrap();

        assert_eq!(second, BatchReport::default());
        assert_eq!(classifier.calls(), 1);
    }
}
