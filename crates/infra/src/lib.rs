//! # PinMail インフラ層
//!
//! ドメイン層が宣言したリソースグラフを実際のリソースへ解決する
//! プロビジョニングエンジンを提供する。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: [`engine::ProvisioningEngine`] がエンジンの
//!   唯一のインターフェース
//! - **2 つの実装**: AWS（本番用）とインメモリ（テスト・ドライラン用）を
//!   デプロイヤー側の環境変数で切り替える
//! - **全体失敗**: プロビジョニングエラーはグラフ解決全体を中断する。
//!   ロールバックや部分的成功のハンドリングは制御プレーン側に委譲する
//!
//! ## モジュール構成
//!
//! - [`engine`] - プロビジョニングエンジンと解決済みスタック
//! - [`error`] - インフラ層で発生するエラーの定義

pub mod engine;
pub mod error;

pub use error::{InfraError, InfraErrorKind};
