//! # 合成ルート
//!
//! メール送信サービスのスタック全体を宣言する単一の合成関数を定義する。
//!
//! ## 合成されるグラフ
//!
//! ```text
//! アクセスロール ──────────┬──────────────┐
//!                          ↓              ↓
//! メッセージングアプリ → メールチャネル   コンピュート関数
//!        │                                ↑      │
//!        └── APP_ID（環境変数）───────────┘      ↓
//!                                          HTTP エンドポイント
//!                                                 ↓
//!                                            出力（公開 URL）
//! ```
//!
//! ## 設計方針
//!
//! - **明示的な設定**: スタックの識別子（サービス名・ステージ名）とタグは
//!   [`StackConfig`] として構築時に渡す。アンビエントなグローバル変数は持たない
//! - **設定必須の送信元**: 送信元アドレスと検証済み ID の ARN は必須の設定値。
//!   ソースへの埋め込み定数にはしない
//! - **宣言して検証して返す**: [`EmailServiceStack::declare`] は合成した宣言集合を
//!   検証してから返す。検証に通らない宣言が外に出ることはない

use std::collections::BTreeMap;

use crate::{
    DomainError,
    endpoint::{CorsPolicy, HttpEndpointDecl, HttpMethod, RouteDecl, SEND_EMAIL_PATH},
    function::{ComputeFunctionDecl, ENV_APP_ID, ENV_FROM_EMAIL, HandlerRef},
    graph::{AttrRef, Attribute, EnvValue, LogicalId, ResourceDecl, StackDeclaration},
    messaging::{EmailChannelDecl, MessagingAppDecl},
    output::OutputDecl,
    role::AccessRoleDecl,
    value_objects::{EmailAddress, Region, ResourceName, SenderIdentityArn, ServiceName, StageName},
};

// =========================================================================
// StackConfig（スタック設定）
// =========================================================================

/// スタックの構築時設定
///
/// 合成ルートに渡す唯一の入力。サービス × ステージの識別子、
/// デプロイ先リージョン、送信元の設定、ハンドラ成果物、伝播タグを持つ。
#[derive(Debug, Clone, PartialEq)]
pub struct StackConfig {
    /// サービス名（物理名プレフィックスの前半）
    pub service:         ServiceName,
    /// ステージ名（物理名プレフィックスの後半）
    pub stage:           StageName,
    /// デプロイ先リージョン
    pub region:          Region,
    /// 送信元メールアドレス（メール送信サブシステムで検証済みであること）
    pub sender_address:  EmailAddress,
    /// 検証済み送信元 ID の ARN
    pub sender_identity: SenderIdentityArn,
    /// コンピュート関数のコード成果物
    pub handler:         HandlerRef,
    /// 全リソースへ伝播するタグ
    pub tags:            BTreeMap<String, String>,
}

impl StackConfig {
    /// スタック設定を作成する
    ///
    /// `service` / `stage` タグは自動で追加される。
    pub fn new(
        service: ServiceName,
        stage: StageName,
        region: Region,
        sender_address: EmailAddress,
        sender_identity: SenderIdentityArn,
        handler: HandlerRef,
    ) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert("service".to_string(), service.as_str().to_string());
        tags.insert("stage".to_string(), stage.as_str().to_string());

        Self {
            service,
            stage,
            region,
            sender_address,
            sender_identity,
            handler,
            tags,
        }
    }
}

// =========================================================================
// EmailServiceStack（合成ルート）
// =========================================================================

/// メール送信サービスの合成ルート
///
/// スタックを構成するすべてのエンティティの唯一の所有者であり、
/// ライフサイクルの唯一の入口。
pub struct EmailServiceStack;

impl EmailServiceStack {
    /// アクセスロールの論理 ID
    pub const ACCESS_ROLE: &'static str = "access-role";
    /// メッセージングアプリケーションの論理 ID
    pub const MESSAGING_APP: &'static str = "messaging-app";
    /// メールチャネルの論理 ID
    pub const EMAIL_CHANNEL: &'static str = "email-channel";
    /// コンピュート関数の論理 ID
    pub const SEND_EMAIL_FUNCTION: &'static str = "send-email-fn";
    /// HTTP エンドポイントの論理 ID
    pub const HTTP_API: &'static str = "http-api";
    /// 公開 URL を公開する出力キー
    pub const OUTPUT_API_URL: &'static str = "api-url";

    /// スタック全体を宣言する
    ///
    /// 6 種のエンティティを合成し、検証済みの宣言集合を返す。
    /// ここで返る値が「未宣言」から先へ進む唯一の経路であり、
    /// プロビジョニング（解決）はエンジンに委譲される。
    ///
    /// # エラー
    ///
    /// 物理名の組み立てに失敗した場合、または合成結果が
    /// 宣言検証（参照整合性・非循環性）に通らない場合。
    pub fn declare(config: &StackConfig) -> Result<StackDeclaration, DomainError> {
        let role_id = LogicalId::new(Self::ACCESS_ROLE)?;
        let app_id = LogicalId::new(Self::MESSAGING_APP)?;
        let channel_id = LogicalId::new(Self::EMAIL_CHANNEL)?;
        let function_id = LogicalId::new(Self::SEND_EMAIL_FUNCTION)?;
        let api_id = LogicalId::new(Self::HTTP_API)?;

        let mut stack = StackDeclaration::new(config.tags.clone());

        // アクセスロール（葉）
        let role_name = ResourceName::prefixed(&config.service, &config.stage, "email-role")?;
        stack.add(
            role_id.clone(),
            ResourceDecl::AccessRole(AccessRoleDecl::email_dispatch(role_name)),
        )?;

        // メッセージングアプリケーション（葉）
        let app_name = ResourceName::prefixed(&config.service, &config.stage, "email-app")?;
        stack.add(
            app_id.clone(),
            ResourceDecl::MessagingApp(MessagingAppDecl::new(app_name)),
        )?;

        // メールチャネル（ロールとアプリケーションに依存）
        stack.add(
            channel_id,
            ResourceDecl::EmailChannel(EmailChannelDecl::new(
                AttrRef::new(app_id.clone(), Attribute::ApplicationId),
                config.sender_address.clone(),
                config.sender_identity.clone(),
                AttrRef::new(role_id.clone(), Attribute::RoleArn),
            )),
        )?;

        // コンピュート関数（ロールに依存、環境変数でアプリケーション ID を消費）
        let function_name = ResourceName::prefixed(&config.service, &config.stage, "send-email")?;
        let mut environment = BTreeMap::new();
        environment.insert(
            ENV_FROM_EMAIL.to_string(),
            EnvValue::Literal(config.sender_address.as_str().to_string()),
        );
        environment.insert(
            ENV_APP_ID.to_string(),
            EnvValue::Attr(AttrRef::new(app_id, Attribute::ApplicationId)),
        );
        stack.add(
            function_id.clone(),
            ResourceDecl::ComputeFunction(ComputeFunctionDecl::new(
                function_name,
                config.handler.clone(),
                AttrRef::new(role_id, Attribute::RoleArn),
                environment,
            )),
        )?;

        // HTTP エンドポイント（関数に依存）
        let api_name = ResourceName::prefixed(&config.service, &config.stage, "api")?;
        stack.add(
            api_id.clone(),
            ResourceDecl::HttpEndpoint(HttpEndpointDecl::new(
                api_name,
                "This api is responsible for sending emails with pinpoint.",
                CorsPolicy::public_post(),
                vec![RouteDecl::new(
                    HttpMethod::Post,
                    SEND_EMAIL_PATH,
                    AttrRef::new(function_id, Attribute::FunctionArn),
                )],
            )),
        )?;

        // 出力（エンドポイントに依存）
        stack.add_output(OutputDecl::new(
            Self::OUTPUT_API_URL,
            AttrRef::new(api_id, Attribute::EndpointUrl),
        ));

        stack.validate()?;
        Ok(stack)
    }
}

// =========================================================================
// テスト
// =========================================================================

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::graph::ResourceKind;

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

    #[test]
    fn test_宣言は検証に通る() {
        let stack = EmailServiceStack::declare(&make_config()).unwrap();
        assert!(stack.validate().is_ok());
    }

    #[test]
    fn test_同じ設定から同じ宣言が得られる() {
        let config = make_config();
        let first = EmailServiceStack::declare(&config).unwrap();
        let second = EmailServiceStack::declare(&config).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_すべての物理名はサービスとステージをプレフィックスに持つ() {
        let stack = EmailServiceStack::declare(&make_config()).unwrap();

        for (_, decl) in stack.resources() {
            if let Some(name) = decl.name() {
                assert!(
                    name.as_str().starts_with("acct-dev-"),
                    "物理名がプレフィックスを持つこと: {name}"
                );
            }
        }
    }

    #[test]
    fn test_エンティティは6種すべて宣言される() {
        let stack = EmailServiceStack::declare(&make_config()).unwrap();

        let kinds: Vec<ResourceKind> = stack.resources().map(|(_, decl)| decl.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ResourceKind::AccessRole,
                ResourceKind::MessagingApp,
                ResourceKind::EmailChannel,
                ResourceKind::ComputeFunction,
                ResourceKind::HttpEndpoint,
            ]
        );
        assert_eq!(stack.outputs().len(), 1);
    }

    #[test]
    fn test_環境変数はfrom_emailとapp_idの2つだけ() {
        let stack = EmailServiceStack::declare(&make_config()).unwrap();
        let function_id = LogicalId::new(EmailServiceStack::SEND_EMAIL_FUNCTION).unwrap();

        let Some(ResourceDecl::ComputeFunction(function)) = stack.get(&function_id) else {
            panic!("コンピュート関数が宣言されていること");
        };

        assert_eq!(function.environment().len(), 2);
        assert_eq!(
            function.environment().get(ENV_FROM_EMAIL),
            Some(&EnvValue::Literal("noreply@example.com".to_string()))
        );
        // アプリケーション ID はリテラルではなく属性参照で宣言される
        assert!(matches!(
            function.environment().get(ENV_APP_ID),
            Some(EnvValue::Attr(attr_ref))
                if attr_ref.target().as_str() == EmailServiceStack::MESSAGING_APP
        ));
    }

    #[test]
    fn test_ルートはpost_send_emailの1つだけ() {
        let stack = EmailServiceStack::declare(&make_config()).unwrap();
        let api_id = LogicalId::new(EmailServiceStack::HTTP_API).unwrap();

        let Some(ResourceDecl::HttpEndpoint(endpoint)) = stack.get(&api_id) else {
            panic!("HTTP エンドポイントが宣言されていること");
        };

        assert_eq!(endpoint.routes().len(), 1);
        assert_eq!(endpoint.routes()[0].route_key(), "POST /send-email");
    }

    #[test]
    fn test_トポロジカル順序は依存を満たす() {
        let stack = EmailServiceStack::declare(&make_config()).unwrap();
        let order: Vec<&str> = stack
            .topological_order()
            .unwrap()
            .into_iter()
            .map(LogicalId::as_str)
            .collect();

        let position = |id: &str| order.iter().position(|x| *x == id).unwrap();

        // チャネルはロールとアプリケーションの後
        assert!(position(EmailServiceStack::ACCESS_ROLE) < position(EmailServiceStack::EMAIL_CHANNEL));
        assert!(
            position(EmailServiceStack::MESSAGING_APP) < position(EmailServiceStack::EMAIL_CHANNEL)
        );
        // エンドポイントは関数の後
        assert!(
            position(EmailServiceStack::SEND_EMAIL_FUNCTION) < position(EmailServiceStack::HTTP_API)
        );
    }

    #[test]
    fn test_チャネルの依存はアプリケーションとロールへ向かう() {
        let stack = EmailServiceStack::declare(&make_config()).unwrap();
        let channel_id = LogicalId::new(EmailServiceStack::EMAIL_CHANNEL).unwrap();

        let deps: Vec<&str> = stack
            .dependencies_of(&channel_id)
            .iter()
            .map(|id| id.as_str())
            .collect();
        assert_eq!(
            deps,
            vec![
                EmailServiceStack::MESSAGING_APP,
                EmailServiceStack::ACCESS_ROLE,
            ]
        );
    }

    #[test]
    fn test_出力はエンドポイントのurlを参照する() {
        let stack = EmailServiceStack::declare(&make_config()).unwrap();
        let output = &stack.outputs()[0];

        assert_eq!(output.key(), EmailServiceStack::OUTPUT_API_URL);
        assert_eq!(output.value().target().as_str(), EmailServiceStack::HTTP_API);
        assert_eq!(output.value().attribute(), Attribute::EndpointUrl);
    }
}
