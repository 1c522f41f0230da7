//! # プロビジョニングエンジン
//!
//! 宣言集合を実際のリソースへ解決するエンジンを定義する。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: [`ProvisioningEngine`] trait でエンジンを抽象化
//! - **2 つの実装**: AWS（本番用）、インメモリ（テスト・ドライラン用）
//! - **環境変数切替**: デプロイヤー側で `PROVISIONER_BACKEND` によりランタイム選択
//!
//! ## 解決のセマンティクス
//!
//! - エンジンは宣言集合をトポロジカル順序で解決する。依存エッジを持つ
//!   宣言は参照先の解決を待つ（独立した枝の並列化はエンジンの自由）
//! - いかなるプロビジョニングエラーもグラフ解決全体を中断する。
//!   部分的な成功状態のハンドリング（ロールバック等）は制御プレーン側の責務
//! - 同じ宣言集合を同じエンジン状態で 2 回解決した結果は構造的に一致する

mod aws;
mod memory;

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
pub use aws::AwsProvisioningEngine;
pub use memory::InMemoryProvisioningEngine;
use pinmail_domain::{
    graph::{AttrRef, Attribute, EnvValue, StackDeclaration},
    value_objects::{ApplicationId, EmailAddress, EndpointUrl, FunctionArn, RoleArn, SenderIdentityArn},
};
use serde::Serialize;

use crate::error::InfraError;

/// プロビジョニングエンジンのインターフェース
///
/// 宣言集合を受け取り、解決済みスタックを返す。
/// 実装は外部の宣言的リソースエンジン（クラウド制御プレーン）か、
/// そのシミュレーションのいずれか。
#[async_trait]
pub trait ProvisioningEngine: Send + Sync {
    /// 宣言集合を解決する
    ///
    /// # エラー
    ///
    /// - 宣言集合が検証に通らない場合（リソース作成前に失敗）
    /// - いずれかのリソース作成が拒否された場合（解決全体を中断）
    async fn resolve(&self, stack: &StackDeclaration) -> Result<ProvisionedStack, InfraError>;
}

// =========================================================================
// ProvisionedStack（解決済みスタック）
// =========================================================================

/// 解決済みのメールチャネル
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedChannel {
    /// 所属するメッセージングアプリケーションの解決済み ID
    pub application_id: ApplicationId,
    /// 送信元メールアドレス
    pub from_address:   EmailAddress,
    /// 送信元 ID の ARN
    pub identity:       SenderIdentityArn,
    /// 送信を認可するロールの解決済み ARN
    pub role_arn:       RoleArn,
    /// チャネルが有効かどうか
    pub enabled:        bool,
}

/// 解決済みスタック
///
/// 「プロビジョニング済み」状態の表現。宣言集合の各エンティティが
/// 解決済み属性（ARN、ID、URL）に置き換わったもの。
///
/// 構造的な等価比較（`PartialEq`）により、同一入力からの再解決が
/// 同一結果を生むこと（宣言の冪等性）を検証できる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedStack {
    /// アクセスロールの解決済み ARN
    pub role_arn:       RoleArn,
    /// メッセージングアプリケーションの解決済み ID
    pub application_id: ApplicationId,
    /// 解決済みメールチャネル
    pub channel:        ProvisionedChannel,
    /// コンピュート関数の解決済み ARN
    pub function_arn:   FunctionArn,
    /// 解決済みの環境変数（属性参照は実値に展開済み）
    pub environment:    BTreeMap<String, String>,
    /// エンドポイントの解決済み公開 URL
    pub endpoint_url:   EndpointUrl,
    /// 宣言されたルートキー
    pub routes:         Vec<String>,
    /// 解決済みのデプロイ成果物出力
    pub outputs:        BTreeMap<String, String>,
}

// =========================================================================
// ResolvedAttributes（属性解決テーブル）
// =========================================================================

/// 解決済み属性のテーブル
///
/// エンジンが解決順に属性を登録し、下流の参照を実値へ展開する。
#[derive(Debug, Default)]
pub(crate) struct ResolvedAttributes {
    values: HashMap<(String, Attribute), String>,
}

impl ResolvedAttributes {
    /// 属性を登録する
    pub(crate) fn insert(
        &mut self,
        id: impl Into<String>,
        attribute: Attribute,
        value: impl Into<String>,
    ) {
        self.values.insert((id.into(), attribute), value.into());
    }

    /// 属性参照を実値へ解決する
    pub(crate) fn resolve(&self, attr_ref: &AttrRef) -> Result<String, InfraError> {
        self.values
            .get(&(attr_ref.target().as_str().to_string(), attr_ref.attribute()))
            .cloned()
            .ok_or_else(|| {
                InfraError::resolution(format!(
                    "{} の {}",
                    attr_ref.target(),
                    attr_ref.attribute()
                ))
            })
    }

    /// 環境変数の宣言を実値のマップへ解決する
    pub(crate) fn resolve_env(
        &self,
        environment: &BTreeMap<String, EnvValue>,
    ) -> Result<BTreeMap<String, String>, InfraError> {
        environment
            .iter()
            .map(|(key, value)| {
                let resolved = match value {
                    EnvValue::Literal(literal) => literal.clone(),
                    EnvValue::Attr(attr_ref) => self.resolve(attr_ref)?,
                };
                Ok((key.clone(), resolved))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pinmail_domain::graph::LogicalId;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_登録済み属性は解決できる() {
        let mut attrs = ResolvedAttributes::default();
        attrs.insert("messaging-app", Attribute::ApplicationId, "abc123");

        let attr_ref = AttrRef::new(
            LogicalId::new("messaging-app").unwrap(),
            Attribute::ApplicationId,
        );
        assert_eq!(attrs.resolve(&attr_ref).unwrap(), "abc123");
    }

    #[test]
    fn test_未登録属性の解決はエラーになる() {
        let attrs = ResolvedAttributes::default();

        let attr_ref = AttrRef::new(
            LogicalId::new("messaging-app").unwrap(),
            Attribute::ApplicationId,
        );
        assert!(attrs.resolve(&attr_ref).is_err());
    }

    #[test]
    fn test_環境変数はリテラルと属性参照の両方を展開する() {
        let mut attrs = ResolvedAttributes::default();
        attrs.insert("messaging-app", Attribute::ApplicationId, "abc123");

        let mut environment = BTreeMap::new();
        environment.insert(
            "FROM_EMAIL".to_string(),
            EnvValue::Literal("noreply@example.com".to_string()),
        );
        environment.insert(
            "APP_ID".to_string(),
            EnvValue::Attr(AttrRef::new(
                LogicalId::new("messaging-app").unwrap(),
                Attribute::ApplicationId,
            )),
        );

        let resolved = attrs.resolve_env(&environment).unwrap();
        assert_eq!(resolved.get("FROM_EMAIL").unwrap(), "noreply@example.com");
        assert_eq!(resolved.get("APP_ID").unwrap(), "abc123");
    }
}
