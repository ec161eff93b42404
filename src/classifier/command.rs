//! AI CLI連携モジュール
//!
//! 画像を一時ディレクトリに書き出し、判定プロンプトとともに
//! claude / codex / gemini のCLIを呼び出す。
//! レスポンスのパースは leaf_sentinel_common を使用。

use super::Classifier;
use crate::ai_provider::AiProvider;
use crate::error::{Result, SentinelError};
use crate::ledger::ImageData;
use leaf_sentinel_common::{build_classify_prompt, parse_prediction_response, Prediction};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;
use tokio::process::Command;

pub struct CommandClassifier {
    provider: AiProvider,
    program: &'static str,
    model: Option<String>,
    temp_dir: PathBuf,
}

impl CommandClassifier {
    pub fn new(provider: AiProvider, model: Option<String>) -> Result<Self> {
        let program = provider.command_name().ok_or_else(|| {
            SentinelError::Config(format!("{:?} は外部CLIを持ちません", provider))
        })?;

        Ok(Self {
            provider,
            program,
            model,
            temp_dir: get_temp_dir()?,
        })
    }
}

impl Classifier for CommandClassifier {
    fn classify(&self, image: ImageData) -> impl Future<Output = Result<Prediction>> + Send {
        let provider = self.provider;
        let model = self.model.clone();
        classify_frame(self.temp_dir.clone(), image, self.program, move |path| {
            provider.command_args(&build_classify_prompt(path), model.as_deref())
        })
    }
}

/// フレームを一時ファイルに書き出してCLIに渡す
///
/// 一時ファイルは呼び出しの終了時に消える。タイムアウト等で途中で
/// 破棄された場合も同様で、子プロセスは `kill_on_drop` で止まる。
async fn classify_frame(
    temp_dir: PathBuf,
    image: ImageData,
    program: &'static str,
    build_args: impl FnOnce(&str) -> Vec<String>,
) -> Result<Prediction> {
    let frame = write_frame(&temp_dir, &image)?;
    let args = build_args(&frame.path().display().to_string().replace('\\', "/"));

    let started = Instant::now();
    let response = run_cli(program, &args).await;
    let elapsed = started.elapsed().as_millis() as u64;

    if let Err(e) = frame.close() {
        tracing::debug!(error = %e, "一時ファイル削除失敗");
    }

    let response = response?;
    tracing::trace!(image = image.name(), elapsed, "CLIレスポンス受信");
    parse_prediction_response(&response, elapsed)
        .map_err(|e| SentinelError::ClassificationFailed(format!("{}: {}", image.name(), e)))
}

fn write_frame(temp_dir: &Path, image: &ImageData) -> Result<NamedTempFile> {
    // CLIが形式を判断できるよう拡張子は残す
    let suffix = Path::new(image.name())
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_else(|| ".jpg".to_string());

    let mut frame = tempfile::Builder::new()
        .prefix("frame-")
        .suffix(&suffix)
        .tempfile_in(temp_dir)?;
    frame.write_all(image.bytes())?;
    frame.flush()?;
    Ok(frame)
}

// =============================================
// CLI固有の関数
// =============================================

fn get_temp_dir() -> Result<PathBuf> {
    let temp_dir = std::env::temp_dir().join("leaf-sentinel");
    std::fs::create_dir_all(&temp_dir)?;
    Ok(temp_dir)
}

async fn run_cli(program: &str, args: &[String]) -> Result<String> {
    // Windowsではcmd /c経由
    #[cfg(windows)]
    let output = Command::new("cmd")
        .arg("/c")
        .arg(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| SentinelError::CliExecution(format!("{} 実行エラー: {}", program, e)))?;

    #[cfg(not(windows))]
    let output = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| SentinelError::CliExecution(format!("{} 実行エラー: {}", program, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SentinelError::CliExecution(format!(
            "{} failed (code {:?}): {}",
            program,
            output.status.code(),
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
