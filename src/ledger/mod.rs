//! アイテム台帳モジュール
//!
//! 投入された画像と判定状態を挿入順に保持する。
//! 結果の書き戻しは位置ではなくIDで対応付ける。
//!
//! - `Ledger`: 台帳本体（同期・単一所有）
//! - `LedgerHandle`: 台帳を所有する調停タスクへのハンドル

mod handle;
mod types;

pub use handle::{LedgerHandle, LedgerView};
pub use types::{ImageData, Item, ItemId, ItemStatus, Outcome};

use chrono::Utc;
use std::collections::{HashMap, HashSet};

/// `complete` の適用結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Pending → 完了へ遷移した
    Applied,
    /// すでに完了済み（書き換えない）
    AlreadySettled,
    /// 台帳に存在しないID（clear済み等）。黙って破棄する
    UnknownItem,
}

#[derive(Debug, Default)]
pub struct Ledger {
    items: Vec<Item>,
    /// ID → items 内の位置
    index: HashMap<ItemId, usize>,
    /// 判定に払い出し済みで結果待ちのID
    claimed: HashSet<ItemId>,
    next_id: u64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pendingアイテムを追加してIDを返す
    pub fn create(&mut self, image: ImageData) -> ItemId {
        self.next_id += 1;
        let id = ItemId(self.next_id);

        self.index.insert(id, self.items.len());
        self.items.push(Item {
            id,
            image,
            created_at: Utc::now(),
            status: ItemStatus::Pending,
        });
        id
    }

    /// 判定結果を書き戻す
    pub fn complete(&mut self, id: ItemId, outcome: Outcome) -> Completion {
        let Some(&pos) = self.index.get(&id) else {
            return Completion::UnknownItem;
        };

        let item = &mut self.items[pos];
        if !item.is_pending() {
            return Completion::AlreadySettled;
        }
        item.status = outcome.into();
        self.claimed.remove(&id);
        Completion::Applied
    }

    /// まだ払い出していないPendingアイテムを選び、払い出し済みにする
    ///
    /// 同じアイテムは結果が書き戻されるまで二度と返さない。
    pub fn claim_pending(&mut self) -> Vec<Item> {
        let claimed = &mut self.claimed;
        self.items
            .iter()
            .filter(|item| item.is_pending() && claimed.insert(item.id))
            .cloned()
            .collect()
    }

    /// 全アイテムを破棄する（IDの採番は継続）
    pub fn clear(&mut self) -> usize {
        let removed = self.items.len();
        self.items.clear();
        self.index.clear();
        self.claimed.clear();
        removed
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.index.get(&id).map(|&pos| &self.items[pos])
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn snapshot(&self) -> Vec<Item> {
        self.items.clone()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
