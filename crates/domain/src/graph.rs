//! # リソース参照グラフ
//!
//! 宣言されたエンティティ間の型付き参照と、スタック全体の宣言集合を定義する。
//!
//! ## 設計方針
//!
//! - **論理 ID と物理名の分離**: スタック内の参照は論理 ID（[`LogicalId`]）で行い、
//!   物理名（`ResourceName`）はエンジンがクラウド側に渡す名前にのみ使う
//! - **属性参照**: 参照は「どのエンティティの」「どの解決済み属性か」の組
//!   （[`AttrRef`]）。デプロイ時にエンジンが実値へ解決する
//! - **厳密な DAG**: 宣言集合は循環を許さない。[`StackDeclaration::validate`] が
//!   参照整合性と非循環性を、リソース作成前に検証する
//!
//! ## 検証されるもの / されないもの
//!
//! | 検証対象 | タイミング |
//! |---------|-----------|
//! | 参照先の存在・属性種別の一致・非循環性 | 宣言時（このモジュール） |
//! | クラウド側のリソース作成可否 | プロビジョニング時（エンジン） |
//! | 送信元 ID の検証状態 | 検証されない（実行時にのみ顕在化） |

use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::Serialize;
use strum::IntoStaticStr;

use crate::{
    DomainError,
    endpoint::HttpEndpointDecl,
    function::ComputeFunctionDecl,
    messaging::{EmailChannelDecl, MessagingAppDecl},
    output::OutputDecl,
    role::AccessRoleDecl,
    value_objects::ResourceName,
};

// =========================================================================
// LogicalId（論理 ID）
// =========================================================================

/// スタック内で一意な宣言のキー
///
/// クラウド側の物理名とは独立した、スタック内部での参照用識別子。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, derive_more::Display)]
#[display("{_0}")]
pub struct LogicalId(String);

impl LogicalId {
    /// 論理 ID を作成する
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation("論理 ID は必須です".to_string()));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// =========================================================================
// Attribute / AttrRef（解決可能な属性とその参照）
// =========================================================================

/// デプロイ時に解決される属性の種別
///
/// 各属性は特定のエンティティ種別だけが解決できる
/// （[`Attribute::expected_kind`]）。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, IntoStaticStr, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum Attribute {
    /// アクセスロールの ARN
    RoleArn,
    /// メッセージングアプリケーションの ID
    ApplicationId,
    /// コンピュート関数の ARN
    FunctionArn,
    /// HTTP エンドポイントの公開 URL
    EndpointUrl,
}

impl Attribute {
    /// この属性を解決できるエンティティ種別を返す
    pub fn expected_kind(&self) -> ResourceKind {
        match self {
            Self::RoleArn => ResourceKind::AccessRole,
            Self::ApplicationId => ResourceKind::MessagingApp,
            Self::FunctionArn => ResourceKind::ComputeFunction,
            Self::EndpointUrl => ResourceKind::HttpEndpoint,
        }
    }
}

/// 他エンティティの解決済み属性への参照
///
/// 宣言時には値を持たず、プロビジョニング時にエンジンが実値へ解決する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AttrRef {
    target:    LogicalId,
    attribute: Attribute,
}

impl AttrRef {
    /// 属性参照を作成する
    pub fn new(target: LogicalId, attribute: Attribute) -> Self {
        Self { target, attribute }
    }

    /// 参照先の論理 ID を取得する
    pub fn target(&self) -> &LogicalId {
        &self.target
    }

    /// 参照する属性を取得する
    pub fn attribute(&self) -> Attribute {
        self.attribute
    }
}

// =========================================================================
// EnvValue（環境変数の値）
// =========================================================================

/// コンピュート関数に渡す環境変数の値
///
/// 上流エンティティの出力に依存する値はリテラルではなく
/// [`EnvValue::Attr`] で宣言し、デプロイ時に解決させる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum EnvValue {
    /// デプロイ時に確定しているリテラル値
    Literal(String),
    /// 上流エンティティの解決済み属性
    Attr(AttrRef),
}

// =========================================================================
// ResourceDecl / ResourceKind（宣言とその種別）
// =========================================================================

/// エンティティ種別
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, IntoStaticStr, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum ResourceKind {
    /// アクセスロール
    AccessRole,
    /// メッセージングアプリケーション
    MessagingApp,
    /// メールチャネル
    EmailChannel,
    /// コンピュート関数
    ComputeFunction,
    /// HTTP エンドポイント
    HttpEndpoint,
}

/// スタックを構成するリソース宣言
///
/// 各バリアントは純粋なデータレコードであり、エンティティ間の
/// 依存は [`AttrRef`] による明示的な参照フィールドで表現される。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ResourceDecl {
    /// アクセスロール
    AccessRole(AccessRoleDecl),
    /// メッセージングアプリケーション
    MessagingApp(MessagingAppDecl),
    /// メールチャネル
    EmailChannel(EmailChannelDecl),
    /// コンピュート関数
    ComputeFunction(ComputeFunctionDecl),
    /// HTTP エンドポイント
    HttpEndpoint(HttpEndpointDecl),
}

impl ResourceDecl {
    /// エンティティ種別を返す
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::AccessRole(_) => ResourceKind::AccessRole,
            Self::MessagingApp(_) => ResourceKind::MessagingApp,
            Self::EmailChannel(_) => ResourceKind::EmailChannel,
            Self::ComputeFunction(_) => ResourceKind::ComputeFunction,
            Self::HttpEndpoint(_) => ResourceKind::HttpEndpoint,
        }
    }

    /// 物理名を返す
    ///
    /// メールチャネルはアプリケーションに従属するため固有の物理名を持たない。
    pub fn name(&self) -> Option<&ResourceName> {
        match self {
            Self::AccessRole(decl) => Some(decl.name()),
            Self::MessagingApp(decl) => Some(decl.name()),
            Self::EmailChannel(_) => None,
            Self::ComputeFunction(decl) => Some(decl.name()),
            Self::HttpEndpoint(decl) => Some(decl.name()),
        }
    }

    /// この宣言が持つすべての属性参照を返す
    ///
    /// 参照整合性検証とトポロジカルソートのエッジ集合になる。
    pub fn references(&self) -> Vec<&AttrRef> {
        match self {
            Self::AccessRole(_) | Self::MessagingApp(_) => Vec::new(),
            Self::EmailChannel(decl) => vec![decl.application(), decl.role()],
            Self::ComputeFunction(decl) => {
                let mut refs = vec![decl.role()];
                refs.extend(decl.environment().values().filter_map(|v| match v {
                    EnvValue::Attr(attr_ref) => Some(attr_ref),
                    EnvValue::Literal(_) => None,
                }));
                refs
            }
            Self::HttpEndpoint(decl) => {
                decl.routes().iter().map(|route| route.integration()).collect()
            }
        }
    }
}

// =========================================================================
// StackDeclaration（スタック全体の宣言集合）
// =========================================================================

/// スタック全体のリソース宣言集合
///
/// 合成ルートが所有する唯一の宣言コンテナ。宣言順を保持し、
/// 参照整合性・非循環性の検証とトポロジカル順序の導出を提供する。
///
/// # 状態
///
/// このシステムの状態は「未宣言」と「プロビジョニング済み」の 2 つだけであり、
/// この型は前者を表す。後者への遷移（DAG の一括解決）はエンジンの責務。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackDeclaration {
    resources: Vec<(LogicalId, ResourceDecl)>,
    outputs:   Vec<OutputDecl>,
    tags:      BTreeMap<String, String>,
}

impl StackDeclaration {
    /// 空の宣言集合を作成する
    ///
    /// `tags` はスタックが作成するすべてのリソースに伝播される。
    pub fn new(tags: BTreeMap<String, String>) -> Self {
        Self {
            resources: Vec::new(),
            outputs: Vec::new(),
            tags,
        }
    }

    /// リソース宣言を追加する
    ///
    /// # エラー
    ///
    /// 同じ論理 ID がすでに宣言されている場合は
    /// `DomainError::DuplicateLogicalId` を返す。
    pub fn add(&mut self, id: LogicalId, decl: ResourceDecl) -> Result<(), DomainError> {
        if self.resources.iter().any(|(existing, _)| existing == &id) {
            return Err(DomainError::DuplicateLogicalId(id.as_str().to_string()));
        }

        self.resources.push((id, decl));
        Ok(())
    }

    /// デプロイ成果物の出力を追加する
    pub fn add_output(&mut self, output: OutputDecl) {
        self.outputs.push(output);
    }

    /// 論理 ID から宣言を取得する
    pub fn get(&self, id: &LogicalId) -> Option<&ResourceDecl> {
        self.resources
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, decl)| decl)
    }

    /// 宣言を宣言順に列挙する
    pub fn resources(&self) -> impl Iterator<Item = (&LogicalId, &ResourceDecl)> {
        self.resources.iter().map(|(id, decl)| (id, decl))
    }

    /// 出力を列挙する
    pub fn outputs(&self) -> &[OutputDecl] {
        &self.outputs
    }

    /// リソースへ伝播するタグを取得する
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// ある宣言が依存する（参照する）論理 ID を返す
    pub fn dependencies_of(&self, id: &LogicalId) -> Vec<&LogicalId> {
        self.get(id)
            .map(|decl| decl.references().iter().map(|r| r.target()).collect())
            .unwrap_or_default()
    }

    /// 宣言集合全体を検証する
    ///
    /// 以下をこの順で検証し、最初の違反で打ち切る:
    ///
    /// 1. すべての参照（出力の参照を含む）の参照先が宣言されていること
    /// 2. 参照される属性が参照先のエンティティ種別で解決可能であること
    /// 3. 参照グラフが非循環であること
    ///
    /// ここを通過した宣言だけがエンジンに渡る。
    pub fn validate(&self) -> Result<(), DomainError> {
        for (id, decl) in self.resources() {
            for attr_ref in decl.references() {
                self.check_reference(id.as_str(), attr_ref)?;
            }
        }

        for output in &self.outputs {
            self.check_reference(output.key(), output.value())?;
        }

        self.topological_order().map(|_| ())
    }

    /// 依存関係を満たす作成順序を返す
    ///
    /// 参照先が必ず参照元より前に並ぶ。互いに依存しない宣言同士の順序は
    /// 宣言順が保たれるため、同じ宣言集合からは常に同じ順序が得られる。
    ///
    /// # エラー
    ///
    /// 参照グラフに循環がある場合は `DomainError::ReferenceCycle` を返す。
    pub fn topological_order(&self) -> Result<Vec<&LogicalId>, DomainError> {
        let index: HashMap<&str, usize> = self
            .resources
            .iter()
            .enumerate()
            .map(|(i, (id, _))| (id.as_str(), i))
            .collect();

        let mut in_degree = vec![0usize; self.resources.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.resources.len()];

        for (i, (_, decl)) in self.resources.iter().enumerate() {
            for attr_ref in decl.references() {
                // 未宣言参照は validate が先に検出する。ここでは無視する
                if let Some(&dep) = index.get(attr_ref.target().as_str()) {
                    in_degree[i] += 1;
                    dependents[dep].push(i);
                }
            }
        }

        let mut queue: VecDeque<usize> = (0..self.resources.len())
            .filter(|&i| in_degree[i] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.resources.len());

        while let Some(i) = queue.pop_front() {
            order.push(&self.resources[i].0);
            for &dependent in &dependents[i] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    queue.push_back(dependent);
                }
            }
        }

        if order.len() < self.resources.len() {
            let remaining: Vec<&str> = self
                .resources
                .iter()
                .enumerate()
                .filter(|(i, _)| in_degree[*i] > 0)
                .map(|(_, (id, _))| id.as_str())
                .collect();
            return Err(DomainError::ReferenceCycle(remaining.join(", ")));
        }

        Ok(order)
    }

    fn check_reference(&self, from: &str, attr_ref: &AttrRef) -> Result<(), DomainError> {
        let Some(target) = self.get(attr_ref.target()) else {
            return Err(DomainError::UnknownReference {
                from: from.to_string(),
                to:   attr_ref.target().as_str().to_string(),
            });
        };

        let expected = attr_ref.attribute().expected_kind();
        if target.kind() != expected {
            return Err(DomainError::AttributeMismatch {
                target:    attr_ref.target().as_str().to_string(),
                attribute: attr_ref.attribute().to_string(),
                kind:      target.kind().to_string(),
            });
        }

        Ok(())
    }
}

// =========================================================================
// テスト
// =========================================================================

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_論理idは空文字列を拒否する() {
        assert!(LogicalId::new("").is_err());
        assert!(LogicalId::new("   ").is_err());
    }

    #[test]
    fn test_属性は期待するエンティティ種別を返す() {
        assert_eq!(Attribute::RoleArn.expected_kind(), ResourceKind::AccessRole);
        assert_eq!(
            Attribute::ApplicationId.expected_kind(),
            ResourceKind::MessagingApp
        );
        assert_eq!(
            Attribute::FunctionArn.expected_kind(),
            ResourceKind::ComputeFunction
        );
        assert_eq!(
            Attribute::EndpointUrl.expected_kind(),
            ResourceKind::HttpEndpoint
        );
    }

    #[test]
    fn test_属性の文字列表現はsnake_case() {
        assert_eq!(Attribute::RoleArn.to_string(), "role_arn");
        assert_eq!(Attribute::ApplicationId.to_string(), "application_id");
    }

    #[test]
    fn test_同じ論理idの重複宣言は拒否される() {
        use crate::value_objects::{ResourceName, ServiceName, StageName};

        let service = ServiceName::new("acct").unwrap();
        let stage = StageName::new("dev").unwrap();
        let name = ResourceName::prefixed(&service, &stage, "email-app").unwrap();

        let mut stack = StackDeclaration::new(BTreeMap::new());
        let id = LogicalId::new("messaging-app").unwrap();
        stack
            .add(
                id.clone(),
                ResourceDecl::MessagingApp(crate::messaging::MessagingAppDecl::new(name.clone())),
            )
            .unwrap();

        let result = stack.add(
            id,
            ResourceDecl::MessagingApp(crate::messaging::MessagingAppDecl::new(name)),
        );
        assert!(matches!(result, Err(DomainError::DuplicateLogicalId(_))));
    }
}
