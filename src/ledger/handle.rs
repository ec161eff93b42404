//! 台帳の調停タスク
//!
//! 台帳は1つのタスクだけが所有し、操作はすべてコマンドチャネル経由で
//! 順番に適用される。変更のたびに最新のビュー（アイテム・集計・進捗）を
//! watch チャネルで配信する。

use super::{Completion, ImageData, Item, ItemId, Ledger, Outcome};
use crate::error::{Result, SentinelError};
use crate::summary::{summarize, LabelCounts, Progress};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

const COMMAND_BUFFER: usize = 256;

enum Command {
    Create {
        image: ImageData,
        reply: oneshot::Sender<ItemId>,
    },
    Complete {
        id: ItemId,
        outcome: Outcome,
        reply: oneshot::Sender<Completion>,
    },
    Clear {
        reply: oneshot::Sender<usize>,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<Item>>,
    },
    Claim {
        reply: oneshot::Sender<Vec<Item>>,
    },
}

/// 表示層に渡す台帳の読み取り専用ビュー
#[derive(Debug, Default)]
pub struct LedgerView {
    /// 変更ごとに1ずつ増える
    pub revision: u64,
    pub items: Vec<Item>,
    pub counts: LabelCounts,
    pub progress: Progress,
}

impl LedgerView {
    fn build(revision: u64, ledger: &Ledger) -> Self {
        Self {
            revision,
            items: ledger.snapshot(),
            counts: summarize(ledger.items()),
            progress: Progress::of(ledger.items()),
        }
    }
}

/// 台帳タスクへのハンドル（複製して共有できる）
#[derive(Clone)]
pub struct LedgerHandle {
    tx: mpsc::Sender<Command>,
    view: watch::Receiver<Arc<LedgerView>>,
}

impl LedgerHandle {
    /// 空の台帳を所有するタスクを起動する
    ///
    /// 全ハンドルが破棄されるとタスクは終了する。
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let (view_tx, view) = watch::channel(Arc::new(LedgerView::default()));
        tokio::spawn(run(Ledger::new(), rx, view_tx));
        Self { tx, view }
    }

    pub async fn create(&self, image: ImageData) -> Result<ItemId> {
        self.request(|reply| Command::Create { image, reply }).await
    }

    pub async fn complete(&self, id: ItemId, outcome: Outcome) -> Result<Completion> {
        self.request(|reply| Command::Complete { id, outcome, reply })
            .await
    }

    pub async fn clear(&self) -> Result<usize> {
        self.request(|reply| Command::Clear { reply }).await
    }

    pub async fn snapshot(&self) -> Result<Vec<Item>> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// 未払い出しのPendingアイテムを選んで払い出し済みにする
    ///
    /// 選択と払い出しは台帳タスク内で一度に行うため、並行して呼んでも
    /// 同じアイテムが二重に返ることはない。
    pub async fn claim_pending(&self) -> Result<Vec<Item>> {
        self.request(|reply| Command::Claim { reply }).await
    }

    /// 最新のビュー
    pub fn view(&self) -> Arc<LedgerView> {
        self.view.borrow().clone()
    }

    /// 変更通知の購読
    pub fn subscribe(&self) -> watch::Receiver<Arc<LedgerView>> {
        self.view.clone()
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| SentinelError::LedgerClosed)?;
        rx.await.map_err(|_| SentinelError::LedgerClosed)
    }
}

async fn run(
    mut ledger: Ledger,
    mut rx: mpsc::Receiver<Command>,
    view_tx: watch::Sender<Arc<LedgerView>>,
) {
    let mut revision = 0u64;
    // 返信より先に配信し、呼び出し側が戻った時点でビューが最新になるようにする
    let mut publish = |ledger: &Ledger| {
        revision += 1;
        view_tx.send_replace(Arc::new(LedgerView::build(revision, ledger)));
    };

    while let Some(command) = rx.recv().await {
        match command {
            Command::Create { image, reply } => {
                let id = ledger.create(image);
                tracing::debug!(%id, "アイテム追加");
                publish(&ledger);
                let _ = reply.send(id);
            }
            Command::Complete { id, outcome, reply } => {
                let completion = ledger.complete(id, outcome);
                match completion {
                    Completion::Applied => publish(&ledger),
                    Completion::AlreadySettled => {
                        tracing::debug!(%id, "判定済みアイテムへの結果を破棄")
                    }
                    Completion::UnknownItem => {
                        tracing::debug!(%id, "台帳に無いアイテムへの結果を破棄")
                    }
                }
                let _ = reply.send(completion);
            }
            Command::Clear { reply } => {
                let removed = ledger.clear();
                tracing::info!(removed, "台帳をクリア");
                if removed > 0 {
                    publish(&ledger);
                }
                let _ = reply.send(removed);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(ledger.snapshot());
            }
            Command::Claim { reply } => {
                let claimed = ledger.claim_pending();
                tracing::debug!(count = claimed.len(), "判定待ちを払い出し");
                let _ = reply.send(claimed);
            }
        }
    }

    tracing::debug!("台帳タスク終了");
}
