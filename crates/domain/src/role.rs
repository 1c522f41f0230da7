//! # アクセスロール
//!
//! 通知サービスとコンピュートランタイムの両方が引き受け可能な
//! アクセスロールの宣言を定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | 用語 | 役割 |
//! |---|------|------|
//! | [`AccessRoleDecl`] | アクセスロール | サービス間アクションを認可するクラウド ID |
//! | [`ServicePrincipal`] | サービスプリンシパル | ロールを引き受け可能なサービスの集合 |
//! | [`PolicyDocument`] | ポリシードキュメント | (action, resource, effect) 文の集合 |
//!
//! ## 権限スコープの判断
//!
//! メッセージ送信アクションはワイルドカードリソース（`*`）でスコープする。
//! ロール作成時点ではチャネルの ARN が確定していないためで、
//! ロールは作成後に不変（ポリシー追加を除く）という制約とのトレードオフになる。

use serde::Serialize;
use strum::IntoStaticStr;

use crate::value_objects::ResourceName;

/// メッセージ送信アクション
///
/// インラインポリシーが許可する唯一のアクション。
pub const SEND_MESSAGES_ACTION: &str = "mobiletargeting:SendMessages";

/// ログ書き込み権限を付与するベースライン実行ポリシーの ARN
pub const BASIC_EXECUTION_POLICY_ARN: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

// =========================================================================
// ServicePrincipal（サービスプリンシパル）
// =========================================================================

/// アクセスロールを引き受け可能なサービスプリンシパル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, IntoStaticStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ServicePrincipal {
    /// 通知サービス（メッセージングアプリケーションの送信主体）
    NotificationService,
    /// コンピュートランタイム（関数の実行主体）
    ComputeRuntime,
}

impl ServicePrincipal {
    /// 信頼ポリシーに記載するサービスドメインを返す
    pub fn service_domain(&self) -> &'static str {
        match self {
            Self::NotificationService => "pinpoint.amazonaws.com",
            Self::ComputeRuntime => "lambda.amazonaws.com",
        }
    }
}

// =========================================================================
// PolicyDocument（ポリシードキュメント）
// =========================================================================

/// ポリシー文の効果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum Effect {
    /// 許可
    Allow,
    /// 拒否
    Deny,
}

/// ポリシー文
///
/// (effect, actions, resources) の組。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyStatement {
    /// 効果
    pub effect:    Effect,
    /// 許可・拒否するアクション
    pub actions:   Vec<String>,
    /// 対象リソースのパターン
    pub resources: Vec<String>,
}

/// ポリシードキュメント
///
/// ロールに添付するポリシー文の集合。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyDocument {
    /// ポリシー文の集合
    pub statements: Vec<PolicyStatement>,
}

impl PolicyDocument {
    /// メッセージ送信だけを許可するインラインポリシーを作成する
    ///
    /// ちょうど 1 つの文を持ち、効果は許可、リソースはワイルドカード。
    pub fn send_messages_only() -> Self {
        Self {
            statements: vec![PolicyStatement {
                effect:    Effect::Allow,
                actions:   vec![SEND_MESSAGES_ACTION.to_string()],
                resources: vec!["*".to_string()],
            }],
        }
    }

    /// IAM ポリシー JSON に変換する
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "Version": "2012-10-17",
            "Statement": self
                .statements
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "Effect": s.effect.to_string(),
                        "Action": s.actions,
                        "Resource": s.resources,
                    })
                })
                .collect::<Vec<_>>(),
        })
    }
}

// =========================================================================
// AccessRoleDecl（アクセスロール宣言）
// =========================================================================

/// アクセスロールの宣言
///
/// 宣言グラフの葉。他のどのエンティティにも依存せず、
/// メールチャネルとコンピュート関数から参照される。
///
/// # 不変条件
///
/// - インラインポリシーはメッセージ送信アクションの許可文をちょうど 1 つ含む
/// - 作成後は不変（スタック破棄まで存続）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessRoleDecl {
    name:                ResourceName,
    trust:               Vec<ServicePrincipal>,
    managed_policy_arns: Vec<String>,
    inline_policy:       PolicyDocument,
}

impl AccessRoleDecl {
    /// メール送信サービス用のアクセスロールを宣言する
    ///
    /// 通知サービスとコンピュートランタイムの両プリンシパルを信頼し、
    /// ベースライン実行ポリシーとメッセージ送信インラインポリシーを添付する。
    pub fn email_dispatch(name: ResourceName) -> Self {
        Self {
            name,
            trust: vec![
                ServicePrincipal::NotificationService,
                ServicePrincipal::ComputeRuntime,
            ],
            managed_policy_arns: vec![BASIC_EXECUTION_POLICY_ARN.to_string()],
            inline_policy: PolicyDocument::send_messages_only(),
        }
    }

    /// 物理名を取得する
    pub fn name(&self) -> &ResourceName {
        &self.name
    }

    /// 信頼するサービスプリンシパルを取得する
    pub fn trust(&self) -> &[ServicePrincipal] {
        &self.trust
    }

    /// 添付するマネージドポリシーの ARN を取得する
    pub fn managed_policy_arns(&self) -> &[String] {
        &self.managed_policy_arns
    }

    /// インラインポリシーを取得する
    pub fn inline_policy(&self) -> &PolicyDocument {
        &self.inline_policy
    }

    /// インラインポリシーの名前を返す
    pub fn inline_policy_name(&self) -> String {
        format!("{}-send-messages", self.name)
    }

    /// 信頼ポリシー JSON に変換する
    pub fn trust_policy_json(&self) -> serde_json::Value {
        serde_json::json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Principal": {
                    "Service": self
                        .trust
                        .iter()
                        .map(|p| p.service_domain())
                        .collect::<Vec<_>>(),
                },
                "Action": "sts:AssumeRole",
            }],
        })
    }
}

// =========================================================================
// テスト
// =========================================================================

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::value_objects::{ServiceName, StageName};

    fn make_role() -> AccessRoleDecl {
        let service = ServiceName::new("acct").unwrap();
        let stage = StageName::new("dev").unwrap();
        let name = ResourceName::prefixed(&service, &stage, "email-role").unwrap();
        AccessRoleDecl::email_dispatch(name)
    }

    #[test]
    fn test_インラインポリシーは送信アクションの許可文をちょうど1つ含む() {
        let role = make_role();
        let policy = role.inline_policy();

        assert_eq!(policy.statements.len(), 1);
        let statement = &policy.statements[0];
        assert_eq!(statement.effect, Effect::Allow);
        assert_eq!(statement.actions, vec![SEND_MESSAGES_ACTION.to_string()]);
        assert_eq!(statement.resources, vec!["*".to_string()]);
    }

    #[test]
    fn test_信頼ポリシーは両プリンシパルを含む() {
        let role = make_role();
        let trust = role.trust_policy_json();

        let services = trust["Statement"][0]["Principal"]["Service"]
            .as_array()
            .unwrap();
        assert!(services.contains(&serde_json::json!("pinpoint.amazonaws.com")));
        assert!(services.contains(&serde_json::json!("lambda.amazonaws.com")));
    }

    #[test]
    fn test_ベースライン実行ポリシーが添付される() {
        let role = make_role();
        assert_eq!(
            role.managed_policy_arns(),
            &[BASIC_EXECUTION_POLICY_ARN.to_string()]
        );
    }

    #[test]
    fn test_ポリシーjsonはiam形式に変換される() {
        let policy = PolicyDocument::send_messages_only();
        let json = policy.to_json();

        assert_eq!(json["Version"], "2012-10-17");
        assert_eq!(json["Statement"][0]["Effect"], "Allow");
        assert_eq!(
            json["Statement"][0]["Action"][0],
            "mobiletargeting:SendMessages"
        );
        assert_eq!(json["Statement"][0]["Resource"][0], "*");
    }

    #[test]
    fn test_インラインポリシー名は物理名から導出される() {
        let role = make_role();
        assert_eq!(role.inline_policy_name(), "acct-dev-email-role-send-messages");
    }
}
