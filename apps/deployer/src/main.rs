//! # PinMail デプロイヤー
//!
//! メール送信サービスのスタックを一括プロビジョニングするエントリーポイント。
//!
//! ## 役割
//!
//! デプロイヤーは宣言 → 検証 → 解決のワンショット実行を担当する:
//!
//! - **宣言**: 設定からスタック全体のリソース宣言集合を合成する
//! - **検証**: 参照整合性と非循環性をリソース作成前に確認する
//! - **解決**: 選択されたエンジンで宣言集合を実リソースへ解決し、
//!   公開 URL をデプロイ成果物として出力する
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │  DeployerConfig │──→│ EmailServiceStack │──→│ ProvisioningEngine │
//! └──────────────┘     │    ::declare      │     │     ::resolve     │
//!                      └──────────────────┘     └──────────────────┘
//!                                                        ↓
//!                                               デプロイ成果物（公開 URL）
//! ```
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `PINMAIL_SERVICE` | **Yes** | サービス名 |
//! | `PINMAIL_STAGE` | **Yes** | ステージ名 |
//! | `PINMAIL_REGION` | No | デプロイ先リージョン（デフォルト: `ap-northeast-1`） |
//! | `PINMAIL_SENDER_ADDRESS` | **Yes** | 送信元メールアドレス（検証済みであること） |
//! | `PINMAIL_SENDER_IDENTITY_ARN` | **Yes** | 検証済み送信元 ID の ARN |
//! | `PINMAIL_HANDLER_ARTIFACT` | No | コード成果物のパス（デフォルト: `dist/handler.zip`） |
//! | `PROVISIONER_BACKEND` | No | `aws` \| `memory`（デフォルト: `memory`） |
//! | `PROVISIONER_ENDPOINT_URL` | No | カスタムエンドポイント（LocalStack 使用時） |
//!
//! ## 起動方法
//!
//! ```bash
//! # ドライラン（インメモリ解決）
//! cargo run -p pinmail-deployer
//!
//! # 本番デプロイ
//! PROVISIONER_BACKEND=aws PINMAIL_STAGE=prod cargo run -p pinmail-deployer --release
//! ```

mod config;
mod error;

use config::DeployerConfig;
use error::DeployerError;
use pinmail_domain::{
    function::HandlerRef,
    stack::{EmailServiceStack, StackConfig},
    value_objects::{EmailAddress, Region, SenderIdentityArn, ServiceName, StageName},
};
use pinmail_infra::engine::{
    AwsProvisioningEngine, InMemoryProvisioningEngine, ProvisionedStack, ProvisioningEngine,
};
use pinmail_shared::observability::{TracingConfig, init_tracing};

/// デプロイヤーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    init_tracing(TracingConfig::from_env("deployer"));

    // 設定読み込み
    let config = DeployerConfig::from_env().expect("設定の読み込みに失敗しました");

    tracing::info!(
        service = %config.service,
        stage = %config.stage,
        backend = %config.provisioner.backend,
        "デプロイを開始します"
    );

    let started_at = chrono::Utc::now();
    let provisioned = run(&config).await?;
    let elapsed = chrono::Utc::now() - started_at;

    for (key, value) in &provisioned.outputs {
        tracing::info!(%key, %value, "デプロイ成果物");
    }
    tracing::info!(
        elapsed_ms = elapsed.num_milliseconds(),
        "デプロイが完了しました"
    );

    Ok(())
}

/// 宣言 → 検証 → 解決のワンショット実行
async fn run(config: &DeployerConfig) -> Result<ProvisionedStack, DeployerError> {
    let region = Region::new(config.region.as_str())?;

    let stack_config = StackConfig::new(
        ServiceName::new(config.service.as_str())?,
        StageName::new(config.stage.as_str())?,
        region.clone(),
        EmailAddress::new(config.sender_address.as_str())?,
        SenderIdentityArn::new(config.sender_identity_arn.as_str())?,
        HandlerRef::new(
            &config.handler.artifact,
            config.handler.entry.as_str(),
            config.handler.runtime.as_str(),
        ),
    );

    let stack = EmailServiceStack::declare(&stack_config)?;
    tracing::info!(
        resources = stack.resources().count(),
        "リソース宣言を合成しました"
    );

    let provisioned = match config.provisioner.backend.as_str() {
        "aws" => {
            let engine = AwsProvisioningEngine::from_env(
                &region,
                config.provisioner.endpoint_url.as_deref(),
            )
            .await;
            engine.resolve(&stack).await?
        }
        _ => {
            tracing::info!("インメモリエンジンでドライランします（リソースは作成されません）");
            let engine = InMemoryProvisioningEngine::new(region);
            engine.resolve(&stack).await?
        }
    };

    Ok(provisioned)
}
