use clap::{Parser, Subcommand};
use crate::ai_provider::AiProvider;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "leaf-sentinel")]
#[command(about = "ドリアン葉の病害AI判定ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// AIプロバイダ (simulated/claude/codex/gemini)
    #[arg(long, default_value = "simulated", global = true)]
    pub ai_provider: AiProvider,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像1枚を判定
    Predict {
        /// 画像ファイルのパス
        #[arg(required = true)]
        image: PathBuf,
    },

    /// フォルダ内の画像をまとめて判定
    Batch {
        /// 画像フォルダのパス
        #[arg(required = true)]
        folder: PathBuf,

        /// 結果JSONの出力先
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// フォルダをカメラに見立てて周期判定
    Live {
        /// フレーム画像のフォルダ
        #[arg(required = true)]
        folder: PathBuf,

        /// 実行秒数（省略時はCtrl-Cまで）
        #[arg(short, long)]
        duration: Option<u64>,

        /// キャプチャ周期（ミリ秒、設定より優先）
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// 病害情報を表示
    Diseases {
        /// 判定カテゴリ（省略時は全件）
        label: Option<String>,
    },

    /// 設定を表示/編集
    Config {
        /// キャプチャ周期（ミリ秒）を設定
        #[arg(long)]
        set_interval: Option<u64>,

        /// 判定タイムアウト（秒）を設定
        #[arg(long)]
        set_timeout: Option<u64>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
