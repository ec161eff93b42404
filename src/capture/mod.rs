//! ライブ判定ループ
//!
//! 一定周期でフレームを1枚取り出し、判定を1回だけ発行して最新結果を差し替える。
//!
//! - 前回の判定が終わっていない周期は丸ごと見送る（ループ由来の判定は常に最大1件）
//! - `stop` は判定の完了を待たない。停止時点で未完了だった判定の結果は破棄する
//! - 停止後の再開は新しいセッションとして扱い、古いセッションの結果は反映しない

mod source;

pub use source::{DirectoryCamera, FrameSource};

use crate::classifier::Classifier;
use crate::error::Result;
use leaf_sentinel_common::Prediction;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    /// カメラ確保済み、タイマー未起動
    Armed,
    Running,
    /// 停止処理中（直後に Idle へ戻る）
    Stopped,
}

/// ループの累計カウンタ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub ticks: u64,
    pub issued: u64,
    /// 前回の判定が未完了で見送った周期
    pub skipped: u64,
    pub published: u64,
    /// 停止後に届いて捨てた結果
    pub discarded: u64,
    pub failed: u64,
}

struct Shared {
    /// start/stop のたびに進む。判定の反映はこのロックの中で行う
    session: Mutex<u64>,
    in_flight: AtomicBool,
    latest: watch::Sender<Option<Prediction>>,
    stats: Mutex<CaptureStats>,
}

impl Shared {
    fn record(&self, update: impl FnOnce(&mut CaptureStats)) {
        update(&mut lock(&self.stats));
    }
}

/// 判定中フラグを必ず下ろす
struct InFlight(Arc<Shared>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::Release);
    }
}

pub struct CaptureLoop<C: Classifier, S: FrameSource> {
    classifier: Arc<C>,
    source: Arc<Mutex<S>>,
    period: Duration,
    shared: Arc<Shared>,
    state: watch::Sender<CaptureState>,
    timer: Option<JoinHandle<()>>,
}

impl<C: Classifier, S: FrameSource> CaptureLoop<C, S> {
    pub fn new(classifier: Arc<C>, source: S, period: Duration) -> Self {
        let (latest, _) = watch::channel(None);
        let (state, _) = watch::channel(CaptureState::Idle);
        Self {
            classifier,
            source: Arc::new(Mutex::new(source)),
            period: period.max(Duration::from_millis(1)),
            shared: Arc::new(Shared {
                session: Mutex::new(0),
                in_flight: AtomicBool::new(false),
                latest,
                stats: Mutex::new(CaptureStats::default()),
            }),
            state,
            timer: None,
        }
    }

    /// カメラを確保して周期判定を始める
    ///
    /// カメラが使えない場合は `DeviceUnavailable` を返し、Idle のまま残る。
    /// tokio ランタイム上で呼ぶこと。
    pub fn start(&mut self) -> Result<()> {
        if self.state() != CaptureState::Idle {
            tracing::warn!(state = ?self.state(), "ライブ判定は既に動作中");
            return Ok(());
        }

        if let Err(e) = lock(&self.source).acquire() {
            tracing::warn!(error = %e, "カメラを確保できません");
            return Err(e);
        }
        self.state.send_replace(CaptureState::Armed);

        self.shared.latest.send_replace(None);
        let session = {
            let mut current = lock(&self.shared.session);
            *current += 1;
            *current
        };

        let shared = self.shared.clone();
        let classifier = self.classifier.clone();
        let source = self.source.clone();
        let period = self.period;

        self.timer = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                tick(session, &shared, &classifier, &source);
            }
        }));

        self.state.send_replace(CaptureState::Running);
        tracing::info!(period_ms = period.as_millis() as u64, session, "ライブ判定開始");
        Ok(())
    }

    /// タイマーを止めてカメラを解放する
    ///
    /// 未完了の判定は待たない。その結果は最新結果に反映されない。
    pub fn stop(&mut self) {
        if self.state() == CaptureState::Idle && self.timer.is_none() {
            return;
        }

        *lock(&self.shared.session) += 1;
        self.state.send_replace(CaptureState::Stopped);

        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        lock(&self.source).release();

        self.state.send_replace(CaptureState::Idle);
        tracing::info!("ライブ判定停止");
    }

    pub fn state(&self) -> CaptureState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<CaptureState> {
        self.state.subscribe()
    }

    /// 最新の判定結果（開始直後はNone）
    pub fn latest(&self) -> Option<Prediction> {
        self.shared.latest.borrow().clone()
    }

    pub fn subscribe_latest(&self) -> watch::Receiver<Option<Prediction>> {
        self.shared.latest.subscribe()
    }

    pub fn stats(&self) -> CaptureStats {
        *lock(&self.shared.stats)
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl<C: Classifier, S: FrameSource> Drop for CaptureLoop<C, S> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn tick<C: Classifier, S: FrameSource>(
    session: u64,
    shared: &Arc<Shared>,
    classifier: &Arc<C>,
    source: &Arc<Mutex<S>>,
) {
    shared.record(|s| s.ticks += 1);

    if shared
        .in_flight
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        shared.record(|s| s.skipped += 1);
        tracing::debug!(session, "前回の判定が未完了のため見送り");
        return;
    }
    let guard = InFlight(shared.clone());

    let Some(frame) = lock(source).next_frame() else {
        tracing::debug!(session, "フレームなし");
        return;
    };

    shared.record(|s| s.issued += 1);
    tracing::debug!(session, frame = frame.name(), "判定発行");

    let shared = shared.clone();
    let classifier = classifier.clone();
    tokio::spawn(async move {
        let _guard = guard;
        let result = classifier.classify(frame).await;

        let current = lock(&shared.session);
        if *current != session {
            shared.record(|s| s.discarded += 1);
            tracing::debug!(session, current = *current, "停止後の判定結果を破棄");
            return;
        }
        match result {
            Ok(prediction) => {
                shared.latest.send_replace(Some(prediction));
                shared.record(|s| s.published += 1);
            }
            Err(e) => {
                shared.record(|s| s.failed += 1);
                tracing::warn!(session, error = %e, "ライブ判定失敗");
            }
        }
    });
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
