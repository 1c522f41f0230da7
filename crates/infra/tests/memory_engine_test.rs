//! インメモリエンジンによるスタック解決の結合テスト
//!
//! 宣言 → 解決 → 呼び出しシミュレーションまでの一連のフローを、
//! 実際のクラウド接続なしで検証する。
//!
//! 実行方法:
//! ```bash
//! cargo test -p pinmail-infra --test memory_engine_test
//! ```

use pinmail_domain::{
    function::{ENV_APP_ID, ENV_FROM_EMAIL, HandlerRef},
    invocation::{DeliveryStatus, SendEmailRequest},
    stack::{EmailServiceStack, StackConfig},
    value_objects::{EmailAddress, Region, SenderIdentityArn, ServiceName, StageName},
};
use pinmail_infra::engine::{InMemoryProvisioningEngine, ProvisioningEngine};
use pretty_assertions::assert_eq;

fn make_config() -> StackConfig {
    StackConfig::new(
        ServiceName::new("acct").unwrap(),
        StageName::new("dev").unwrap(),
        Region::new("ap-northeast-1").unwrap(),
        EmailAddress::new("noreply@example.com").unwrap(),
        SenderIdentityArn::new("arn:aws:ses:ap-northeast-1:123456789012:identity/example.com")
            .unwrap(),
        HandlerRef::new("dist/handler.zip", "index.handler", "nodejs22.x"),
    )
}

fn make_engine() -> InMemoryProvisioningEngine {
    InMemoryProvisioningEngine::new(Region::new("ap-northeast-1").unwrap())
}

fn make_request() -> SendEmailRequest {
    SendEmailRequest {
        to:      EmailAddress::new("user@example.com").unwrap(),
        subject: "件名".to_string(),
        body:    "本文".to_string(),
    }
}

#[tokio::test]
async fn test_同一入力の再解決は構造的に同一のスタックを返す() {
    let engine = make_engine();
    let stack = EmailServiceStack::declare(&make_config()).unwrap();

    let first = engine.resolve(&stack).await.unwrap();
    let second = engine.resolve(&stack).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_チャネルのアプリケーションidは解決済みidと一致する() {
    let engine = make_engine();
    let stack = EmailServiceStack::declare(&make_config()).unwrap();

    let provisioned = engine.resolve(&stack).await.unwrap();

    // 参照整合性: 複製された値ではなく、同一の解決済み ID であること
    assert_eq!(provisioned.channel.application_id, provisioned.application_id);
}

#[tokio::test]
async fn test_環境変数のapp_idは解決済みアプリケーションidに展開される() {
    let engine = make_engine();
    let stack = EmailServiceStack::declare(&make_config()).unwrap();

    let provisioned = engine.resolve(&stack).await.unwrap();

    assert_eq!(
        provisioned.environment.get(ENV_APP_ID).unwrap(),
        provisioned.application_id.as_str()
    );
    assert_eq!(
        provisioned.environment.get(ENV_FROM_EMAIL).unwrap(),
        "noreply@example.com"
    );
}

#[tokio::test]
async fn test_ルートはpost_send_emailの1つだけ解決される() {
    let engine = make_engine();
    let stack = EmailServiceStack::declare(&make_config()).unwrap();

    let provisioned = engine.resolve(&stack).await.unwrap();

    assert_eq!(provisioned.routes, vec!["POST /send-email".to_string()]);
}

#[tokio::test]
async fn test_出力はルートセグメントを含まないhttps_urlになる() {
    let engine = make_engine();
    let stack = EmailServiceStack::declare(&make_config()).unwrap();

    let provisioned = engine.resolve(&stack).await.unwrap();

    let url = provisioned
        .outputs
        .get(EmailServiceStack::OUTPUT_API_URL)
        .unwrap();
    assert!(url.starts_with("https://"), "HTTPS であること: {url}");
    assert!(!url.ends_with('/'), "末尾スラッシュを含まないこと: {url}");
    assert!(
        !url.contains("/send-email"),
        "ルートセグメントを含まないこと: {url}"
    );
    assert_eq!(url, provisioned.endpoint_url.as_str());
}

#[tokio::test]
async fn test_未検証の送信元でもプロビジョニングは成功する() {
    let engine = make_engine();
    let stack = EmailServiceStack::declare(&make_config()).unwrap();

    // 検証手続きを一切行わずに解決する
    let provisioned = engine.resolve(&stack).await.unwrap();
    assert!(provisioned.channel.enabled);
}

#[tokio::test]
async fn test_未検証の送信元への呼び出しは配送失敗を報告する() {
    let engine = make_engine();
    let stack = EmailServiceStack::declare(&make_config()).unwrap();
    let provisioned = engine.resolve(&stack).await.unwrap();

    let response = engine.invoke_send_email(&provisioned, &make_request());

    // 沈黙の成功ではなく、明示的な失敗として報告される
    assert_eq!(response.status, DeliveryStatus::Failed);
    assert!(response.reason.is_some());
    assert_eq!(response.message_id, None);
}

#[tokio::test]
async fn test_検証済みの送信元への呼び出しは成功する() {
    let config = make_config();
    let engine = make_engine();
    engine.verify_identity(&config.sender_address);

    let stack = EmailServiceStack::declare(&config).unwrap();
    let provisioned = engine.resolve(&stack).await.unwrap();

    let response = engine.invoke_send_email(&provisioned, &make_request());

    assert_eq!(response.status, DeliveryStatus::Sent);
    assert!(response.message_id.is_some());
}

#[tokio::test]
async fn test_ステージ違いのスタックは別々の物理名に解決される() {
    let engine = make_engine();

    let dev = EmailServiceStack::declare(&make_config()).unwrap();
    let prod_config = StackConfig::new(
        ServiceName::new("acct").unwrap(),
        StageName::new("prod").unwrap(),
        Region::new("ap-northeast-1").unwrap(),
        EmailAddress::new("noreply@example.com").unwrap(),
        SenderIdentityArn::new("arn:aws:ses:ap-northeast-1:123456789012:identity/example.com")
            .unwrap(),
        HandlerRef::new("dist/handler.zip", "index.handler", "nodejs22.x"),
    );
    let prod = EmailServiceStack::declare(&prod_config).unwrap();

    let dev_stack = engine.resolve(&dev).await.unwrap();
    let prod_stack = engine.resolve(&prod).await.unwrap();

    assert_ne!(dev_stack.application_id, prod_stack.application_id);
    assert_ne!(dev_stack.endpoint_url, prod_stack.endpoint_url);
    assert!(dev_stack.role_arn.as_str().contains("acct-dev-"));
    assert!(prod_stack.role_arn.as_str().contains("acct-prod-"));
}
