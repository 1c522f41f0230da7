//! # デプロイヤーエラー定義
//!
//! デプロイヤー固有のエラーを定義する。終了コードの判定と
//! ログ出力のための最小限の分類のみ行う。

use thiserror::Error;

/// デプロイヤーで発生するエラー
#[derive(Debug, Error)]
pub enum DeployerError {
    /// 設定値の変換エラー
    ///
    /// 環境変数から読み込んだ値がドメインの検証に通らなかった。
    #[error("設定エラー: {0}")]
    Config(#[from] pinmail_domain::DomainError),

    /// プロビジョニングエラー
    #[error("プロビジョニングエラー: {0}")]
    Provisioning(#[from] pinmail_infra::InfraError),
}
