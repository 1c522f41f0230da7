//! AWS プロビジョニングエンジン実装
//!
//! IAM・Pinpoint・Lambda・API Gateway v2 の各 API を呼び出して
//! 宣言集合を実リソースへ解決する。本番環境で使用する。
//!
//! ## 解決順序
//!
//! 宣言集合のトポロジカル順序に従い、参照先が解決されてから
//! 参照元を作成する。いずれかの作成が拒否された時点で解決全体を
//! 中断し、以降のリソースは作成しない。
//!
//! ## 送信元 ID のプリフライト確認
//!
//! チャネル作成前に SES v2 で送信元 ID の検証状態を照会し、
//! 未検証の場合は警告ログを出す。プロビジョニング自体は失敗させない
//! （未検証はあくまで実行時にのみ顕在化する運用リスク）。

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_apigatewayv2::types::{Cors, IntegrationType, ProtocolType};
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{Environment, FunctionCode, Runtime};
use aws_sdk_pinpoint::types::{CreateApplicationRequest, EmailChannelRequest};
use pinmail_domain::{
    endpoint::HttpEndpointDecl,
    function::ComputeFunctionDecl,
    graph::{Attribute, ResourceDecl, StackDeclaration},
    messaging::{EmailChannelDecl, MessagingAppDecl},
    role::AccessRoleDecl,
    value_objects::{ApplicationId, EndpointUrl, FunctionArn, Region, RoleArn},
};

use super::{ProvisionedChannel, ProvisionedStack, ProvisioningEngine, ResolvedAttributes};
use crate::error::InfraError;

/// AWS プロビジョニングエンジン
///
/// 各サービスのクライアントをラップする。認証情報は SDK の
/// デフォルト認証チェーンで解決する（ローカル: 環境変数、本番: IAM ロール）。
pub struct AwsProvisioningEngine {
    iam:      aws_sdk_iam::Client,
    pinpoint: aws_sdk_pinpoint::Client,
    lambda:   aws_sdk_lambda::Client,
    apigw:    aws_sdk_apigatewayv2::Client,
    ses:      aws_sdk_sesv2::Client,
}

impl AwsProvisioningEngine {
    /// デフォルト認証チェーンからエンジンを作成する
    ///
    /// # 引数
    ///
    /// * `region` - デプロイ先リージョン
    /// * `endpoint` - カスタムエンドポイント URL（例: `http://localhost:4566`）。
    ///   `None` の場合は各サービスのデフォルトエンドポイントを使用する。
    pub async fn from_env(region: &Region, endpoint: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.as_str().to_string()));

        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let config = loader.load().await;

        Self {
            iam:      aws_sdk_iam::Client::new(&config),
            pinpoint: aws_sdk_pinpoint::Client::new(&config),
            lambda:   aws_sdk_lambda::Client::new(&config),
            apigw:    aws_sdk_apigatewayv2::Client::new(&config),
            ses:      aws_sdk_sesv2::Client::new(&config),
        }
    }

    /// アクセスロールを作成し、ポリシーを添付する
    async fn create_access_role(
        &self,
        decl: &AccessRoleDecl,
        tags: &HashMap<String, String>,
    ) -> Result<String, InfraError> {
        let iam_tags = tags
            .iter()
            .map(|(key, value)| {
                aws_sdk_iam::types::Tag::builder()
                    .key(key)
                    .value(value)
                    .build()
                    .map_err(|e| InfraError::iam(format!("タグの構築に失敗: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let created = self
            .iam
            .create_role()
            .role_name(decl.name().as_str())
            .assume_role_policy_document(decl.trust_policy_json().to_string())
            .set_tags(Some(iam_tags))
            .send()
            .await
            .map_err(|e| InfraError::iam(format!("ロール作成に失敗: {e}")))?;

        let arn = created
            .role()
            .map(|role| role.arn().to_string())
            .ok_or_else(|| InfraError::iam("ロール作成応答に ARN がありません".to_string()))?;

        for policy_arn in decl.managed_policy_arns() {
            self.iam
                .attach_role_policy()
                .role_name(decl.name().as_str())
                .policy_arn(policy_arn)
                .send()
                .await
                .map_err(|e| InfraError::iam(format!("マネージドポリシー添付に失敗: {e}")))?;
        }

        self.iam
            .put_role_policy()
            .role_name(decl.name().as_str())
            .policy_name(decl.inline_policy_name())
            .policy_document(decl.inline_policy().to_json().to_string())
            .send()
            .await
            .map_err(|e| InfraError::iam(format!("インラインポリシー添付に失敗: {e}")))?;

        tracing::info!(name = %decl.name(), %arn, "アクセスロールを作成");
        Ok(arn)
    }

    /// メッセージングアプリケーションを作成する
    async fn create_messaging_app(
        &self,
        decl: &MessagingAppDecl,
        tags: &HashMap<String, String>,
    ) -> Result<String, InfraError> {
        let request = CreateApplicationRequest::builder()
            .name(decl.name().as_str())
            .set_tags(Some(tags.clone()))
            .build();

        let created = self
            .pinpoint
            .create_app()
            .create_application_request(request)
            .send()
            .await
            .map_err(|e| InfraError::pinpoint(format!("アプリケーション作成に失敗: {e}")))?;

        let id = created
            .application_response()
            .and_then(|app| app.id().map(|id| id.to_string()))
            .ok_or_else(|| {
                InfraError::pinpoint("アプリケーション作成応答に ID がありません".to_string())
            })?;

        tracing::info!(name = %decl.name(), %id, "メッセージングアプリケーションを作成");
        Ok(id)
    }

    /// メールチャネルを有効化する
    async fn enable_email_channel(
        &self,
        decl: &EmailChannelDecl,
        application_id: &str,
        role_arn: &str,
    ) -> Result<(), InfraError> {
        self.preflight_identity_check(decl).await;

        let request = EmailChannelRequest::builder()
            .enabled(decl.enabled())
            .from_address(decl.from_address().as_str())
            .identity(decl.identity().as_str())
            .role_arn(role_arn)
            .build();

        self.pinpoint
            .update_email_channel()
            .application_id(application_id)
            .email_channel_request(request)
            .send()
            .await
            .map_err(|e| InfraError::pinpoint(format!("メールチャネル有効化に失敗: {e}")))?;

        tracing::info!(application_id, "メールチャネルを有効化");
        Ok(())
    }

    /// 送信元 ID の検証状態を照会する（非致命）
    ///
    /// 未検証はプロビジョニング時点では失敗にならず、実行時の
    /// 配送失敗としてのみ顕在化する。ここでは運用者への警告に留める。
    async fn preflight_identity_check(&self, decl: &EmailChannelDecl) {
        match self
            .ses
            .get_email_identity()
            .email_identity(decl.from_address().as_str())
            .send()
            .await
        {
            Ok(output) if output.verified_for_sending_status() => {}
            Ok(_) => {
                tracing::warn!("送信元 ID が未検証です。実行時のすべての送信が失敗します");
            }
            Err(e) => {
                tracing::warn!(error = %e, "送信元 ID の検証状態を確認できませんでした");
            }
        }
    }

    /// コンピュート関数を作成する
    async fn create_function(
        &self,
        decl: &ComputeFunctionDecl,
        role_arn: &str,
        environment: &HashMap<String, String>,
        tags: &HashMap<String, String>,
    ) -> Result<String, InfraError> {
        let artifact = std::fs::read(decl.handler().artifact()).map_err(InfraError::artifact)?;

        let created = self
            .lambda
            .create_function()
            .function_name(decl.name().as_str())
            .runtime(Runtime::from(decl.handler().runtime.as_str()))
            .handler(&decl.handler().handler)
            .role(role_arn)
            .code(FunctionCode::builder().zip_file(Blob::new(artifact)).build())
            .environment(
                Environment::builder()
                    .set_variables(Some(environment.clone()))
                    .build(),
            )
            .set_tags(Some(tags.clone()))
            .send()
            .await
            .map_err(|e| InfraError::lambda(format!("関数作成に失敗: {e}")))?;

        let arn = created
            .function_arn()
            .map(str::to_string)
            .ok_or_else(|| InfraError::lambda("関数作成応答に ARN がありません".to_string()))?;

        tracing::info!(name = %decl.name(), %arn, "コンピュート関数を作成");
        Ok(arn)
    }

    /// HTTP エンドポイントを作成し、ルートとインテグレーションを束ねる
    async fn create_http_endpoint(
        &self,
        decl: &HttpEndpointDecl,
        function_arn: &str,
        function_name: &str,
        tags: &HashMap<String, String>,
    ) -> Result<String, InfraError> {
        let cors = Cors::builder()
            .set_allow_headers(Some(decl.cors().allow_headers.clone()))
            .set_allow_methods(Some(
                decl.cors()
                    .allow_methods
                    .iter()
                    .map(|method| method.to_string())
                    .collect(),
            ))
            .allow_credentials(decl.cors().allow_credentials)
            .set_allow_origins(Some(decl.cors().allow_origins.clone()))
            .build();

        let created = self
            .apigw
            .create_api()
            .name(decl.name().as_str())
            .description(decl.description())
            .protocol_type(ProtocolType::Http)
            .cors_configuration(cors)
            .set_tags(Some(tags.clone()))
            .send()
            .await
            .map_err(|e| InfraError::api_gateway(format!("API 作成に失敗: {e}")))?;

        let api_id = created
            .api_id()
            .map(str::to_string)
            .ok_or_else(|| InfraError::api_gateway("API 作成応答に ID がありません".to_string()))?;
        let endpoint = created
            .api_endpoint()
            .map(str::to_string)
            .ok_or_else(|| {
                InfraError::api_gateway("API 作成応答にエンドポイントがありません".to_string())
            })?;

        for route in decl.routes() {
            let integration = self
                .apigw
                .create_integration()
                .api_id(&api_id)
                .integration_type(IntegrationType::AwsProxy)
                .integration_uri(function_arn)
                .payload_format_version("2.0")
                .send()
                .await
                .map_err(|e| {
                    InfraError::api_gateway(format!("インテグレーション作成に失敗: {e}"))
                })?;

            let integration_id = integration.integration_id().ok_or_else(|| {
                InfraError::api_gateway(
                    "インテグレーション作成応答に ID がありません".to_string(),
                )
            })?;

            self.apigw
                .create_route()
                .api_id(&api_id)
                .route_key(route.route_key())
                .target(format!("integrations/{integration_id}"))
                .send()
                .await
                .map_err(|e| InfraError::api_gateway(format!("ルート作成に失敗: {e}")))?;
        }

        self.apigw
            .create_stage()
            .api_id(&api_id)
            .stage_name("$default")
            .auto_deploy(true)
            .send()
            .await
            .map_err(|e| InfraError::api_gateway(format!("ステージ作成に失敗: {e}")))?;

        // インテグレーションからの同期呼び出しを許可する
        self.lambda
            .add_permission()
            .function_name(function_name)
            .statement_id("apigateway-invoke")
            .action("lambda:InvokeFunction")
            .principal("apigateway.amazonaws.com")
            .send()
            .await
            .map_err(|e| InfraError::lambda(format!("呼び出し権限の付与に失敗: {e}")))?;

        tracing::info!(name = %decl.name(), %endpoint, "HTTP エンドポイントを作成");
        Ok(endpoint)
    }
}

#[async_trait]
impl ProvisioningEngine for AwsProvisioningEngine {
    async fn resolve(&self, stack: &StackDeclaration) -> Result<ProvisionedStack, InfraError> {
        stack.validate()?;

        let tags: HashMap<String, String> = stack
            .tags()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let mut attrs = ResolvedAttributes::default();
        let mut role_arn = None;
        let mut application_id = None;
        let mut channel = None;
        let mut function_arn = None;
        let mut function_name = None;
        let mut environment = None;
        let mut endpoint_url = None;
        let mut routes = Vec::new();

        for id in stack.topological_order()? {
            let Some(decl) = stack.get(id) else { continue };

            match decl {
                ResourceDecl::AccessRole(role) => {
                    let arn = self.create_access_role(role, &tags).await?;
                    attrs.insert(id.as_str(), Attribute::RoleArn, arn.as_str());
                    role_arn = Some(RoleArn::new(arn)?);
                }
                ResourceDecl::MessagingApp(app) => {
                    let resolved = self.create_messaging_app(app, &tags).await?;
                    attrs.insert(id.as_str(), Attribute::ApplicationId, resolved.as_str());
                    application_id = Some(ApplicationId::new(resolved)?);
                }
                ResourceDecl::EmailChannel(decl) => {
                    let app = attrs.resolve(decl.application())?;
                    let role = attrs.resolve(decl.role())?;
                    self.enable_email_channel(decl, &app, &role).await?;
                    channel = Some(ProvisionedChannel {
                        application_id: ApplicationId::new(app)?,
                        from_address:   decl.from_address().clone(),
                        identity:       decl.identity().clone(),
                        role_arn:       RoleArn::new(role)?,
                        enabled:        decl.enabled(),
                    });
                }
                ResourceDecl::ComputeFunction(function) => {
                    let role = attrs.resolve(function.role())?;
                    let resolved_env: HashMap<String, String> = attrs
                        .resolve_env(function.environment())?
                        .into_iter()
                        .collect();
                    let arn = self
                        .create_function(function, &role, &resolved_env, &tags)
                        .await?;
                    attrs.insert(id.as_str(), Attribute::FunctionArn, arn.as_str());
                    function_arn = Some(FunctionArn::new(arn)?);
                    function_name = Some(function.name().as_str().to_string());
                    environment = Some(resolved_env.into_iter().collect());
                }
                ResourceDecl::HttpEndpoint(endpoint) => {
                    let function = endpoint
                        .routes()
                        .first()
                        .map(|route| attrs.resolve(route.integration()))
                        .transpose()?
                        .ok_or_else(|| {
                            InfraError::resolution("エンドポイントにルートがありません")
                        })?;
                    let name = function_name.as_deref().ok_or_else(|| {
                        InfraError::resolution("コンピュート関数が未解決です")
                    })?;
                    let url = self
                        .create_http_endpoint(endpoint, &function, name, &tags)
                        .await?;
                    attrs.insert(id.as_str(), Attribute::EndpointUrl, url.as_str());
                    endpoint_url = Some(EndpointUrl::new(url)?);
                    routes = endpoint
                        .routes()
                        .iter()
                        .map(|route| route.route_key())
                        .collect();
                }
            }
        }

        let outputs = stack
            .outputs()
            .iter()
            .map(|output| Ok((output.key().to_string(), attrs.resolve(output.value())?)))
            .collect::<Result<_, InfraError>>()?;

        Ok(ProvisionedStack {
            role_arn: role_arn
                .ok_or_else(|| InfraError::resolution("アクセスロールが宣言されていません"))?,
            application_id: application_id.ok_or_else(|| {
                InfraError::resolution("メッセージングアプリケーションが宣言されていません")
            })?,
            channel: channel
                .ok_or_else(|| InfraError::resolution("メールチャネルが宣言されていません"))?,
            function_arn: function_arn
                .ok_or_else(|| InfraError::resolution("コンピュート関数が宣言されていません"))?,
            environment: environment.unwrap_or_default(),
            endpoint_url: endpoint_url
                .ok_or_else(|| InfraError::resolution("HTTP エンドポイントが宣言されていません"))?,
            routes,
            outputs,
        })
    }
}
