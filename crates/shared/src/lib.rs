//! # PinMail 共有基盤
//!
//! クレート間で共有される横断的な基盤コードを集約する。
//!
//! ## モジュール構成
//!
//! - [`observability`] - トレーシング初期化とログ出力形式の設定
//!   （`observability` feature で有効化）

pub mod observability;
