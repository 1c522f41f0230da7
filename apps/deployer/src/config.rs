//! # デプロイヤー設定
//!
//! 環境変数からデプロイヤーの設定を読み込む。

use std::env;

/// デプロイヤーの設定
#[derive(Debug, Clone)]
pub struct DeployerConfig {
    /// サービス名（物理名プレフィックスの前半）
    pub service: String,
    /// ステージ名（物理名プレフィックスの後半）
    pub stage: String,
    /// デプロイ先リージョン
    pub region: String,
    /// 送信元メールアドレス（メール送信サブシステムで検証済みであること）
    pub sender_address: String,
    /// 検証済み送信元 ID の ARN
    pub sender_identity_arn: String,
    /// ハンドラ設定
    pub handler: HandlerConfig,
    /// エンジン設定
    pub provisioner: ProvisionerConfig,
}

/// コンピュート関数のハンドラ設定
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// コード成果物（zip）のパス
    pub artifact: String,
    /// エントリポイント（例: `index.handler`）
    pub entry:    String,
    /// 実行ランタイムの識別子（例: `nodejs22.x`）
    pub runtime:  String,
}

/// プロビジョニングエンジンの設定
///
/// `PROVISIONER_BACKEND` 環境変数でエンジンを切り替える:
/// - `aws`: AWS 制御プレーンで実リソースを作成（本番）
/// - `memory`: インメモリ解決のみ（ドライラン・デフォルト）
#[derive(Debug, Clone)]
pub struct ProvisionerConfig {
    /// エンジンバックエンド（"aws" | "memory"）
    pub backend:      String,
    /// カスタムエンドポイント URL（LocalStack 使用時に設定、未設定で AWS デフォルト）
    pub endpoint_url: Option<String>,
}

impl DeployerConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            service: env::var("PINMAIL_SERVICE")
                .expect("PINMAIL_SERVICE が設定されていません（.env.example を参照してください）"),
            stage: env::var("PINMAIL_STAGE")
                .expect("PINMAIL_STAGE が設定されていません（.env.example を参照してください）"),
            region: env::var("PINMAIL_REGION").unwrap_or_else(|_| "ap-northeast-1".to_string()),
            sender_address: env::var("PINMAIL_SENDER_ADDRESS").expect(
                "PINMAIL_SENDER_ADDRESS が設定されていません（.env.example を参照してください）",
            ),
            sender_identity_arn: env::var("PINMAIL_SENDER_IDENTITY_ARN").expect(
                "PINMAIL_SENDER_IDENTITY_ARN が設定されていません（.env.example を参照してください）",
            ),
            handler: HandlerConfig::from_env(),
            provisioner: ProvisionerConfig::from_env(),
        })
    }
}

impl HandlerConfig {
    /// 環境変数からハンドラ設定を読み込む
    fn from_env() -> Self {
        Self {
            artifact: env::var("PINMAIL_HANDLER_ARTIFACT")
                .unwrap_or_else(|_| "dist/handler.zip".to_string()),
            entry:    env::var("PINMAIL_HANDLER_ENTRY")
                .unwrap_or_else(|_| "index.handler".to_string()),
            runtime:  env::var("PINMAIL_HANDLER_RUNTIME")
                .unwrap_or_else(|_| "nodejs22.x".to_string()),
        }
    }
}

impl ProvisionerConfig {
    /// 環境変数からエンジン設定を読み込む
    fn from_env() -> Self {
        Self {
            backend:      env::var("PROVISIONER_BACKEND").unwrap_or_else(|_| "memory".to_string()),
            endpoint_url: env::var("PROVISIONER_ENDPOINT_URL").ok(),
        }
    }
}
