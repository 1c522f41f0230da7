//! 宣言エラーがリソース作成前に検出されることの結合テスト
//!
//! 不正な宣言集合（未宣言参照・属性種別不一致）がエンジンに渡った場合、
//! いかなる解決も行われずに宣言エラーとして中断されることを検証する。
//!
//! 実行方法:
//! ```bash
//! cargo test -p pinmail-infra --test stack_validation_test
//! ```

use std::collections::BTreeMap;

use pinmail_domain::{
    DomainError,
    graph::{AttrRef, Attribute, LogicalId, ResourceDecl, StackDeclaration},
    messaging::{EmailChannelDecl, MessagingAppDecl},
    value_objects::{EmailAddress, Region, ResourceName, SenderIdentityArn, ServiceName, StageName},
};
use pinmail_infra::engine::{InMemoryProvisioningEngine, ProvisioningEngine};
use pinmail_infra::error::InfraErrorKind;

fn make_app_name(suffix: &str) -> ResourceName {
    let service = ServiceName::new("acct").unwrap();
    let stage = StageName::new("dev").unwrap();
    ResourceName::prefixed(&service, &stage, suffix).unwrap()
}

fn make_channel(application: AttrRef, role: AttrRef) -> EmailChannelDecl {
    EmailChannelDecl::new(
        application,
        EmailAddress::new("noreply@example.com").unwrap(),
        SenderIdentityArn::new("arn:aws:ses:ap-northeast-1:123456789012:identity/example.com")
            .unwrap(),
        role,
    )
}

#[tokio::test]
async fn test_未宣言参照を持つ宣言集合は解決前に拒否される() {
    let mut stack = StackDeclaration::new(BTreeMap::new());
    stack
        .add(
            LogicalId::new("messaging-app").unwrap(),
            ResourceDecl::MessagingApp(MessagingAppDecl::new(make_app_name("email-app"))),
        )
        .unwrap();
    // アクセスロールを宣言しないままチャネルが参照する
    stack
        .add(
            LogicalId::new("email-channel").unwrap(),
            ResourceDecl::EmailChannel(make_channel(
                AttrRef::new(
                    LogicalId::new("messaging-app").unwrap(),
                    Attribute::ApplicationId,
                ),
                AttrRef::new(LogicalId::new("access-role").unwrap(), Attribute::RoleArn),
            )),
        )
        .unwrap();

    assert!(matches!(
        stack.validate(),
        Err(DomainError::UnknownReference { .. })
    ));

    let engine = InMemoryProvisioningEngine::new(Region::new("ap-northeast-1").unwrap());
    let err = engine.resolve(&stack).await.unwrap_err();
    assert!(matches!(err.kind(), InfraErrorKind::Declaration(_)));
}

#[tokio::test]
async fn test_属性種別が一致しない参照は拒否される() {
    let mut stack = StackDeclaration::new(BTreeMap::new());
    stack
        .add(
            LogicalId::new("messaging-app").unwrap(),
            ResourceDecl::MessagingApp(MessagingAppDecl::new(make_app_name("email-app"))),
        )
        .unwrap();
    // メッセージングアプリケーションにロール ARN を要求する
    stack
        .add(
            LogicalId::new("email-channel").unwrap(),
            ResourceDecl::EmailChannel(make_channel(
                AttrRef::new(
                    LogicalId::new("messaging-app").unwrap(),
                    Attribute::ApplicationId,
                ),
                AttrRef::new(
                    LogicalId::new("messaging-app").unwrap(),
                    Attribute::RoleArn,
                ),
            )),
        )
        .unwrap();

    assert!(matches!(
        stack.validate(),
        Err(DomainError::AttributeMismatch { .. })
    ));
}
