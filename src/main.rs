use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use leaf_sentinel::batch::BatchOrchestrator;
use leaf_sentinel::capture::{CaptureLoop, DirectoryCamera};
use leaf_sentinel::cli::{Cli, Commands};
use leaf_sentinel::config::Config;
use leaf_sentinel::error::SentinelError;
use leaf_sentinel::ledger::{ItemStatus, LedgerHandle};
use leaf_sentinel::summary::LabelCounts;
use leaf_sentinel::{classifier, scanner};
use leaf_sentinel_common::{disease_info, disease_library, DiseaseInfo, Label, Prediction};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load().context("設定の読み込みに失敗しました")?;

    match cli.command {
        Commands::Predict { image } => {
            println!("🍃 leaf-sentinel - 単体判定\n");

            let info = scanner::inspect_file(&image)?;
            match info.dimensions {
                Some((width, height)) => println!("画像: {} ({}x{})\n", info.file_name, width, height),
                None => println!("画像: {}\n", info.file_name),
            }
            let classifier = Arc::new(classifier::build(cli.ai_provider, &config)?);
            let ledger = LedgerHandle::spawn();
            ledger.create(scanner::load_image(&info)?).await?;

            BatchOrchestrator::new(ledger.clone(), classifier)
                .submit_pending()
                .await?;

            for item in ledger.snapshot().await? {
                match &item.status {
                    ItemStatus::Completed { result } => {
                        print_prediction(item.image.name(), result);
                        print_disease(disease_info(result.label));
                    }
                    ItemStatus::Failed { reason } => {
                        println!("✖ {}: {}", item.image.name(), reason);
                    }
                    ItemStatus::Pending => {}
                }
            }
        }

        Commands::Batch { folder, output } => {
            println!("🍃 leaf-sentinel - 一括判定\n");

            // 1. 画像スキャン
            println!("[1/3] 画像をスキャン中...");
            let images = scanner::scan_folder(&folder)?;
            if images.is_empty() {
                return Err(SentinelError::NoImagesFound(folder.display().to_string()).into());
            }
            println!("✔ {}枚の画像を検出\n", images.len());

            let classifier = Arc::new(classifier::build(cli.ai_provider, &config)?);
            let ledger = LedgerHandle::spawn();
            for info in &images {
                match scanner::load_image(info) {
                    Ok(data) => {
                        ledger.create(data).await?;
                    }
                    Err(e) => println!("⚠ スキップ: {}", e),
                }
            }

            // 2. 判定
            println!("[2/3] AI判定中...");
            let bar = progress_bar(ledger.view().progress.total as u64);
            let mut updates = ledger.subscribe();
            let watcher = {
                let bar = bar.clone();
                tokio::spawn(async move {
                    while updates.changed().await.is_ok() {
                        let view = updates.borrow_and_update().clone();
                        bar.set_position(view.progress.settled() as u64);
                    }
                })
            };

            let report = BatchOrchestrator::new(ledger.clone(), classifier)
                .submit_pending()
                .await?;
            watcher.abort();
            bar.finish_and_clear();
            println!(
                "✔ 判定完了（成功 {} / 失敗 {}）\n",
                report.classified, report.failed
            );

            // 3. 集計
            println!("[3/3] 集計");
            let view = ledger.view();
            print_counts(&view.counts);
            for item in &view.items {
                if let ItemStatus::Failed { reason } = &item.status {
                    println!("  ✖ {}: {}", item.image.name(), reason);
                }
            }

            if let Some(output) = output {
                let json = serde_json::to_string_pretty(&serde_json::json!({
                    "items": &view.items,
                    "counts": &view.counts,
                    "progress": &view.progress,
                    "report": &report,
                }))?;
                std::fs::write(&output, json)
                    .with_context(|| format!("結果の保存に失敗: {}", output.display()))?;
                println!("\n✔ 結果を保存: {}", output.display());
            }

            println!("\n✅ 完了");
        }

        Commands::Live { folder, duration, interval_ms } => {
            println!("🍃 leaf-sentinel - ライブ判定\n");

            let period = interval_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.capture_interval());
            let classifier = Arc::new(classifier::build(cli.ai_provider, &config)?);
            let mut capture = CaptureLoop::new(classifier, DirectoryCamera::new(&folder), period);

            if let Err(e) = capture.start() {
                println!("✖ {}", e);
                return Ok(());
            }
            println!("▶ {}ms 周期で判定中（Ctrl-Cで停止）\n", capture.period().as_millis());

            let mut latest = capture.subscribe_latest();
            let deadline = async {
                match duration {
                    Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                    None => std::future::pending::<()>().await,
                }
            };
            tokio::pin!(deadline);

            loop {
                tokio::select! {
                    changed = latest.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let prediction = latest.borrow_and_update().clone();
                        if let Some(prediction) = prediction {
                            print_prediction("frame", &prediction);
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                    _ = &mut deadline => break,
                }
            }

            capture.stop();
            let stats = capture.stats();
            println!(
                "\n■ 停止（周期 {} / 判定 {} / 見送り {} / 破棄 {} / 失敗 {}）",
                stats.ticks, stats.issued, stats.skipped, stats.discarded, stats.failed
            );
        }

        Commands::Diseases { label } => match label {
            Some(label) => {
                let label: Label = label.parse()?;
                print_disease(disease_info(label));
            }
            None => {
                for info in disease_library() {
                    print_disease(info);
                    println!();
                }
            }
        },

        Commands::Config { set_interval, set_timeout, show } => {
            let mut config = config;
            let mut changed = false;

            if let Some(ms) = set_interval {
                config.set_capture_interval(ms)?;
                println!("✔ キャプチャ周期を {}ms に設定しました", ms);
                changed = true;
            }
            if let Some(seconds) = set_timeout {
                config.set_timeout(seconds)?;
                println!("✔ タイムアウトを {}秒 に設定しました", seconds);
                changed = true;
            }
            if changed {
                config.save()?;
            }

            if show {
                let (min, max) = config.simulated_latency_ms;
                println!("設定:");
                println!("  モデル: {}", config.model.as_deref().unwrap_or("（CLI既定）"));
                println!("  キャプチャ周期: {}ms", config.capture_interval().as_millis());
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  擬似モデル遅延: {}〜{}ms", min, max);
                println!("  設定ファイル: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template("  {bar:40.green/white} {pos}/{len} ({elapsed})") {
        bar.set_style(style);
    }
    bar
}

fn print_prediction(name: &str, prediction: &Prediction) {
    let marker = if prediction.label.is_healthy() { "✔" } else { "⚠" };
    print!(
        "{} {}: {} ({:.1}%, {}ms)",
        marker,
        name,
        prediction.label,
        prediction.confidence_percent(),
        prediction.latency_ms
    );
    match prediction.focus() {
        Some(focus) => println!(" 注目位置 ({:.0}%, {:.0}%)", focus.x, focus.y),
        None => println!(),
    }
}

fn print_disease(info: &DiseaseInfo) {
    println!("■ {}", info.label);
    println!("  {}", info.description);
    println!("  症状:");
    for symptom in info.symptoms {
        println!("    - {}", symptom);
    }
    println!("  対策:");
    for step in info.management {
        println!("    - {}", step);
    }
}

fn print_counts(counts: &LabelCounts) {
    let total: usize = counts.values().sum();
    for label in Label::ALL {
        let count = counts.get(&label).copied().unwrap_or(0);
        let share = if total == 0 { 0.0 } else { count as f64 * 100.0 / total as f64 };
        println!("  {:<12} {:>4} ({:>5.1}%)", label.as_str(), count, share);
    }
}
