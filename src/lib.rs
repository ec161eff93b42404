//! ドリアン葉の病害判定クライアント
//!
//! 画像を判定バックエンドに投げ、非同期に返る結果をアイテム単位の状態へ
//! IDで書き戻す。単体・一括・ライブ（周期キャプチャ）の3経路を持つ。

pub mod ai_provider;
pub mod batch;
pub mod capture;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod ledger;
pub mod scanner;
pub mod summary;
