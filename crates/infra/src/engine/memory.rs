//! インメモリプロビジョニングエンジン実装
//!
//! 実際のクラウドリソースを作成せず、決定的な解決だけを行う。
//! テストとドライランで使用する。
//!
//! ## 決定性
//!
//! 解決される属性（ID・ARN・URL）はすべて物理名から UUID v5 で導出する。
//! 同じ宣言集合は何度解決しても構造的に同一のスタックになる。
//!
//! ## 送信元 ID の検証シミュレーション
//!
//! 外部のメール送信サブシステムでの検証手続きを
//! [`verify_identity`](InMemoryProvisioningEngine::verify_identity) で模倣する。
//! 未検証のままでもプロビジョニングは成功し、
//! [`invoke_send_email`](InMemoryProvisioningEngine::invoke_send_email) が
//! 配送失敗を報告する。実環境と同じ非対称性をテストで再現するため。

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pinmail_domain::{
    graph::{Attribute, ResourceDecl, StackDeclaration},
    invocation::{SendEmailRequest, SendEmailResponse},
    value_objects::{ApplicationId, EmailAddress, EndpointUrl, FunctionArn, Region, RoleArn},
};
use uuid::Uuid;

use super::{ProvisionedChannel, ProvisionedStack, ProvisioningEngine, ResolvedAttributes};
use crate::error::InfraError;

/// シミュレーションで使うアカウント ID
const SIMULATED_ACCOUNT_ID: &str = "000000000000";

/// インメモリプロビジョニングエンジン
///
/// 宣言集合をトポロジカル順序で walk し、決定的な属性を払い出す。
#[derive(Debug, Clone)]
pub struct InMemoryProvisioningEngine {
    region:              Region,
    verified_identities: Arc<Mutex<HashSet<String>>>,
}

impl InMemoryProvisioningEngine {
    /// 新しいインメモリエンジンを作成する
    pub fn new(region: Region) -> Self {
        Self {
            region,
            verified_identities: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// 送信元アドレスを検証済みとして登録する
    ///
    /// 外部サブシステムでの検証手続きに相当する。
    pub fn verify_identity(&self, address: &EmailAddress) {
        self.verified_identities
            .lock()
            .unwrap()
            .insert(address.as_str().to_string());
    }

    /// 送信元アドレスが検証済みかどうかを返す
    pub fn is_verified(&self, address: &EmailAddress) -> bool {
        self.verified_identities
            .lock()
            .unwrap()
            .contains(address.as_str())
    }

    /// 解決済みスタックへの送信リクエストをシミュレートする
    ///
    /// エンドポイント → 関数 → チャネルの実行時フローを模倣する。
    /// 送信元 ID が未検証の場合、配送失敗が必ず `Failed` として
    /// 報告される。沈黙の成功にはならない。
    pub fn invoke_send_email(
        &self,
        stack: &ProvisionedStack,
        request: &SendEmailRequest,
    ) -> SendEmailResponse {
        if !stack.channel.enabled {
            return SendEmailResponse::failed("メールチャネルが無効です");
        }

        if !self.is_verified(&stack.channel.from_address) {
            return SendEmailResponse::failed(
                "送信元 ID が未検証のため配送に失敗しました",
            );
        }

        let message_id = deterministic_id(&format!(
            "{}:{}:{}",
            stack.application_id,
            request.to.as_str(),
            request.subject
        ));
        SendEmailResponse::sent(message_id)
    }
}

#[async_trait]
impl ProvisioningEngine for InMemoryProvisioningEngine {
    async fn resolve(&self, stack: &StackDeclaration) -> Result<ProvisionedStack, InfraError> {
        stack.validate()?;

        let mut attrs = ResolvedAttributes::default();
        let mut role_arn = None;
        let mut application_id = None;
        let mut channel = None;
        let mut function_arn = None;
        let mut environment = None;
        let mut endpoint_url = None;
        let mut routes = Vec::new();

        for id in stack.topological_order()? {
            let Some(decl) = stack.get(id) else { continue };

            match decl {
                ResourceDecl::AccessRole(role) => {
                    let arn = format!(
                        "arn:aws:iam::{SIMULATED_ACCOUNT_ID}:role/{}",
                        role.name()
                    );
                    attrs.insert(id.as_str(), Attribute::RoleArn, arn.as_str());
                    role_arn = Some(RoleArn::new(arn)?);
                    tracing::info!(name = %role.name(), "アクセスロールを解決（シミュレーション）");
                }
                ResourceDecl::MessagingApp(app) => {
                    let resolved = deterministic_id(app.name().as_str());
                    attrs.insert(id.as_str(), Attribute::ApplicationId, resolved.as_str());
                    application_id = Some(ApplicationId::new(resolved)?);
                    tracing::info!(name = %app.name(), "メッセージングアプリケーションを解決（シミュレーション）");
                }
                ResourceDecl::EmailChannel(decl) => {
                    let app = attrs.resolve(decl.application())?;
                    let role = attrs.resolve(decl.role())?;
                    channel = Some(ProvisionedChannel {
                        application_id: ApplicationId::new(app)?,
                        from_address:   decl.from_address().clone(),
                        identity:       decl.identity().clone(),
                        role_arn:       RoleArn::new(role)?,
                        enabled:        decl.enabled(),
                    });
                    tracing::info!("メールチャネルを解決（シミュレーション）");
                }
                ResourceDecl::ComputeFunction(function) => {
                    let arn = format!(
                        "arn:aws:lambda:{}:{SIMULATED_ACCOUNT_ID}:function:{}",
                        self.region,
                        function.name()
                    );
                    attrs.insert(id.as_str(), Attribute::FunctionArn, arn.as_str());
                    function_arn = Some(FunctionArn::new(arn)?);
                    environment = Some(attrs.resolve_env(function.environment())?);
                    tracing::info!(name = %function.name(), "コンピュート関数を解決（シミュレーション）");
                }
                ResourceDecl::HttpEndpoint(endpoint) => {
                    let api_id: String = deterministic_id(endpoint.name().as_str())
                        .chars()
                        .take(10)
                        .collect();
                    let url = format!(
                        "https://{api_id}.execute-api.{}.amazonaws.com",
                        self.region
                    );
                    attrs.insert(id.as_str(), Attribute::EndpointUrl, url.as_str());
                    endpoint_url = Some(EndpointUrl::new(url)?);
                    routes = endpoint
                        .routes()
                        .iter()
                        .map(|route| route.route_key())
                        .collect();
                    tracing::info!(name = %endpoint.name(), "HTTP エンドポイントを解決（シミュレーション）");
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

/// 物理名から決定的な識別子を導出する
fn deterministic_id(name: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes())
        .simple()
        .to_string()
}
