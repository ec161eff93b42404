//! ライブ判定ループの統合テスト
//!
//! 仮想時間で周期を進め、判定の重なり防止と停止後の結果破棄を検証

mod support;

use leaf_sentinel::capture::{CaptureLoop, CaptureState, DirectoryCamera};
use leaf_sentinel::error::SentinelError;
use leaf_sentinel_common::Label;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use support::{prediction, settle, ManualClassifier};
use tempfile::{tempdir, TempDir};
use tokio::time::Instant;

const PERIOD: Duration = Duration::from_millis(2000);

fn camera_folder() -> TempDir {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("frame1.jpg"), b"frame-1").unwrap();
    std::fs::write(dir.path().join("frame2.jpg"), b"frame-2").unwrap();
    dir
}

fn capture(
    classifier: &Arc<ManualClassifier>,
    folder: &Path,
) -> CaptureLoop<ManualClassifier, DirectoryCamera> {
    CaptureLoop::new(classifier.clone(), DirectoryCamera::new(folder), PERIOD)
}

async fn advance_to(origin: Instant, ms: u64) {
    tokio::time::sleep_until(origin + Duration::from_millis(ms)).await;
}

/// 前の周期の判定が未完了なら次の周期は判定を発行しない
#[tokio::test(start_paused = true)]
async fn test_tick_skipped_while_call_outstanding() {
    let folder = camera_folder();
    let classifier = ManualClassifier::new();
    let mut capture = capture(&classifier, folder.path());

    let origin = Instant::now();
    capture.start().unwrap();
    assert_eq!(capture.state(), CaptureState::Running);

    // 周期1: 発行
    advance_to(origin, 2100).await;
    assert_eq!(classifier.issued(), vec!["frame1.jpg"]);

    // 周期2: 周期1が未完了なので見送り
    advance_to(origin, 4100).await;
    assert_eq!(classifier.issued().len(), 1);
    assert_eq!(capture.stats().skipped, 1);

    classifier.resolve("frame1.jpg", Ok(prediction(Label::Anthracnose, 0.93)));
    settle().await;
    assert_eq!(capture.latest().map(|p| p.label), Some(Label::Anthracnose));

    // 周期3: 再び発行（次のフレーム）
    advance_to(origin, 6100).await;
    assert_eq!(classifier.issued(), vec!["frame1.jpg", "frame2.jpg"]);
    assert_eq!(classifier.outstanding(), 1);

    capture.stop();
}

/// 停止時に未完了だった判定の結果は最新結果を変えない
#[tokio::test(start_paused = true)]
async fn test_stop_discards_late_result() {
    let folder = camera_folder();
    let classifier = ManualClassifier::new();
    let mut capture = capture(&classifier, folder.path());

    let origin = Instant::now();
    capture.start().unwrap();

    advance_to(origin, 2100).await;
    classifier.resolve_oldest(Ok(prediction(Label::Healthy, 0.99)));
    settle().await;
    let before = capture.latest();
    assert_eq!(before.map(|p| p.label), Some(Label::Healthy));

    advance_to(origin, 4100).await;
    assert_eq!(classifier.outstanding(), 1);

    capture.stop();
    assert_eq!(capture.state(), CaptureState::Idle);

    classifier.resolve_oldest(Ok(prediction(Label::Dieback, 0.95)));
    settle().await;
    assert_eq!(capture.latest(), before);
    assert_eq!(capture.stats().discarded, 1);

    // 停止後は周期が発火しない
    advance_to(origin, 20_000).await;
    assert_eq!(classifier.issued().len(), 2);
}

/// 再開直後は古いセッションの判定が終わるまで発行しない
#[tokio::test(start_paused = true)]
async fn test_restart_waits_for_stale_call() {
    let folder = camera_folder();
    let classifier = ManualClassifier::new();
    let mut capture = capture(&classifier, folder.path());

    let origin = Instant::now();
    capture.start().unwrap();
    advance_to(origin, 2100).await;
    assert_eq!(classifier.outstanding(), 1);

    capture.stop();
    capture.start().unwrap();
    assert!(capture.latest().is_none());

    // 再開後の最初の周期は見送り
    advance_to(origin, 4200).await;
    assert_eq!(classifier.issued().len(), 1);

    classifier.resolve_oldest(Ok(prediction(Label::SootyMold, 0.9)));
    settle().await;
    assert!(capture.latest().is_none());

    // 次の周期から通常どおり
    advance_to(origin, 6200).await;
    assert_eq!(classifier.issued().len(), 2);
    classifier.resolve_oldest(Ok(prediction(Label::LeafBlight, 0.9)));
    settle().await;
    assert_eq!(capture.latest().map(|p| p.label), Some(Label::LeafBlight));
}

/// 判定失敗はループを止めない
#[tokio::test(start_paused = true)]
async fn test_failed_call_keeps_loop_running() {
    let folder = camera_folder();
    let classifier = ManualClassifier::new();
    let mut capture = capture(&classifier, folder.path());

    let origin = Instant::now();
    capture.start().unwrap();
    advance_to(origin, 2100).await;
    classifier.resolve_oldest(Err(SentinelError::Timeout(30)));
    settle().await;

    assert!(capture.latest().is_none());
    assert_eq!(capture.stats().failed, 1);
    assert_eq!(capture.state(), CaptureState::Running);

    advance_to(origin, 4100).await;
    assert_eq!(classifier.issued().len(), 2);
}

/// カメラがなければ Idle のまま、判定も発行しない
#[tokio::test(start_paused = true)]
async fn test_missing_camera_reports_device_unavailable() {
    let classifier = ManualClassifier::new();
    let mut capture = capture(&classifier, Path::new("/nonexistent/camera"));

    let origin = Instant::now();
    let result = capture.start();
    assert!(matches!(result, Err(SentinelError::DeviceUnavailable(_))));
    assert_eq!(capture.state(), CaptureState::Idle);

    advance_to(origin, 10_000).await;
    assert!(classifier.issued().is_empty());
}

/// 破棄時に停止する
#[tokio::test(start_paused = true)]
async fn test_drop_stops_loop() {
    let folder = camera_folder();
    let classifier = ManualClassifier::new();
    let capture = {
        let mut capture = capture(&classifier, folder.path());
        capture.start().unwrap();
        capture.subscribe_state()
    };

    assert_eq!(*capture.borrow(), CaptureState::Idle);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(classifier.issued().is_empty());
}
