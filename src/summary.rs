//! 集計モジュール
//!
//! 台帳から判定カテゴリ別の件数と進捗を算出する。
//! 状態を持たず、呼び出しごとに全件を数え直す。

use crate::ledger::{Item, ItemStatus};
use leaf_sentinel_common::Label;
use serde::Serialize;
use std::collections::BTreeMap;

/// カテゴリ → 件数（Label の宣言順）
pub type LabelCounts = BTreeMap<Label, usize>;

/// 完了アイテムのみをカテゴリ別に数える
pub fn summarize(items: &[Item]) -> LabelCounts {
    let mut counts = LabelCounts::new();
    for prediction in items.iter().filter_map(Item::prediction) {
        *counts.entry(prediction.label).or_insert(0) += 1;
    }
    counts
}

/// 台帳の進捗
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub failed: usize,
}

impl Progress {
    pub fn of(items: &[Item]) -> Self {
        let mut progress = Self {
            total: items.len(),
            ..Default::default()
        };
        for item in items {
            match item.status {
                ItemStatus::Pending => progress.pending += 1,
                ItemStatus::Completed { .. } => progress.completed += 1,
                ItemStatus::Failed { .. } => progress.failed += 1,
            }
        }
        progress
    }

    /// 未判定のアイテムがあるか（「判定開始」を押せるか）
    pub fn has_pending(&self) -> bool {
        self.pending > 0
    }

    pub fn settled(&self) -> usize {
        self.completed + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{ImageData, Ledger, Outcome};
    use leaf_sentinel_common::{FocusPoint, Prediction};

    fn classified(label: Label) -> Outcome {
        Outcome::Classified(Prediction::new(label, 0.9, 50, FocusPoint::CENTER))
    }

    #[test]
    fn test_summarize_excludes_pending() {
        let mut ledger = Ledger::new();
        let a = ledger.create(ImageData::new("a.jpg", vec![1]));
        let b = ledger.create(ImageData::new("b.jpg", vec![2]));
        ledger.create(ImageData::new("c.jpg", vec![3]));

        ledger.complete(a, classified(Label::Healthy));
        ledger.complete(b, classified(Label::Healthy));

        let counts = summarize(ledger.items());
        assert_eq!(counts, LabelCounts::from([(Label::Healthy, 2)]));
    }

    #[test]
    fn test_summarize_excludes_failed() {
        let mut ledger = Ledger::new();
        let a = ledger.create(ImageData::new("a.jpg", vec![1]));
        let b = ledger.create(ImageData::new("b.jpg", vec![2]));

        ledger.complete(a, classified(Label::Dieback));
        ledger.complete(b, Outcome::Failed("timeout".into()));

        let counts = summarize(ledger.items());
        assert_eq!(counts.get(&Label::Dieback), Some(&1));
        assert_eq!(counts.values().sum::<usize>(), 1);
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize(&[]).is_empty());
    }

    #[test]
    fn test_progress_counts() {
        let mut ledger = Ledger::new();
        let a = ledger.create(ImageData::new("a.jpg", vec![1]));
        let b = ledger.create(ImageData::new("b.jpg", vec![2]));
        ledger.create(ImageData::new("c.jpg", vec![3]));

        ledger.complete(a, classified(Label::SootyMold));
        ledger.complete(b, Outcome::Failed("error".into()));

        let progress = Progress::of(ledger.items());
        assert_eq!(
            progress,
            Progress { total: 3, pending: 1, completed: 1, failed: 1 }
        );
        assert!(progress.has_pending());
        assert_eq!(progress.settled(), 2);
    }
}
