use crate::error::{Result, SentinelError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// キャプチャ周期の環境変数（設定ファイルより優先）
pub const INTERVAL_ENV: &str = "LEAF_SENTINEL_INTERVAL_MS";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// AI CLIに渡すモデル名（未指定ならCLIの既定）
    pub model: Option<String>,
    pub capture_interval_ms: u64,
    pub timeout_seconds: u64,
    /// 擬似モデルの遅延範囲 (最小, 最大)
    pub simulated_latency_ms: (u64, u64),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: None,
            capture_interval_ms: 2000,
            timeout_seconds: 30,
            simulated_latency_ms: (50, 250),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SentinelError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("leaf-sentinel").join("config.json"))
    }

    /// キャプチャ周期（環境変数を優先）
    pub fn capture_interval(&self) -> Duration {
        let ms = std::env::var(INTERVAL_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&ms| ms > 0)
            .unwrap_or(self.capture_interval_ms);
        Duration::from_millis(ms.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }

    pub fn set_capture_interval(&mut self, ms: u64) -> Result<()> {
        if ms == 0 {
            return Err(SentinelError::Config("キャプチャ周期は1ms以上を指定してください".into()));
        }
        self.capture_interval_ms = ms;
        Ok(())
    }

    pub fn set_timeout(&mut self, seconds: u64) -> Result<()> {
        if seconds == 0 {
            return Err(SentinelError::Config("タイムアウトは1秒以上を指定してください".into()));
        }
        self.timeout_seconds = seconds;
        Ok(())
    }
}
