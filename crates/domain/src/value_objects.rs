//! # 共通値オブジェクト
//!
//! 複数の宣言で共有される値オブジェクトを定義する。
//!
//! ## 設計方針
//!
//! - **Newtype パターン**: プリミティブ型をラップし、型安全性を確保
//! - **バリデーション**: 生成時に検証し、不正な値の存在を型レベルで排除
//! - **不変性**: 一度作成したら変更不可
//!
//! ## 含まれる型
//!
//! | 型 | ラップ対象 | 用途 |
//! |---|-----------|------|
//! | [`ServiceName`] | `String` | サービス識別子（物理名プレフィックスの前半） |
//! | [`StageName`] | `String` | ステージ識別子（物理名プレフィックスの後半） |
//! | [`ResourceName`] | `String` | `{service}-{stage}-{suffix}` 形式の物理名 |
//! | [`Region`] | `String` | デプロイ先リージョン |
//! | [`EmailAddress`] | `String` | 送信元・宛先メールアドレス |
//! | [`ApplicationId`] | `String` | メッセージングアプリケーションの解決済み ID |
//! | [`RoleArn`] / [`FunctionArn`] / [`SenderIdentityArn`] | `String` | 解決済み ARN |
//! | [`EndpointUrl`] | `String` | エンドポイントの解決済み公開 URL |

use serde::{Deserialize, Serialize};

use crate::DomainError;

// =========================================================================
// ServiceName / StageName（物理名プレフィックス）
// =========================================================================

define_name_string! {
    /// サービス名（値オブジェクト）
    ///
    /// スタックが宣言するすべてのリソースの物理名は
    /// `{service}-{stage}-` で始まる。その前半部分。
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - 英小文字・数字・ハイフンのみ
    /// - 最大 32 文字
    pub struct ServiceName {
        label: "サービス名",
        max_length: 32,
    }
}

define_name_string! {
    /// ステージ名（値オブジェクト）
    ///
    /// デプロイ環境の識別子（例: `dev`, `stg`, `prod`）。
    /// 物理名プレフィックスの後半部分。
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - 英小文字・数字・ハイフンのみ
    /// - 最大 16 文字
    pub struct StageName {
        label: "ステージ名",
        max_length: 16,
    }
}

define_name_string! {
    /// デプロイ先リージョン（値オブジェクト）
    ///
    /// 例: `ap-northeast-1`, `us-east-1`
    pub struct Region {
        label: "リージョン",
        max_length: 32,
    }
}

// =========================================================================
// ResourceName（物理名）
// =========================================================================

/// リソースの物理名（値オブジェクト）
///
/// スタック内のすべてのリソースは `{service}-{stage}-{suffix}` 形式の
/// 物理名を持つ。プレフィックスにより、同一アカウント内で
/// サービス × ステージごとの名前空間が分離される。
///
/// # 使用例
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use pinmail_domain::value_objects::{ResourceName, ServiceName, StageName};
///
/// let service = ServiceName::new("acct")?;
/// let stage = StageName::new("dev")?;
/// let name = ResourceName::prefixed(&service, &stage, "api")?;
/// assert_eq!(name.as_str(), "acct-dev-api");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceName(String);

impl ResourceName {
    /// `{service}-{stage}-{suffix}` 形式の物理名を作成する
    ///
    /// # バリデーション
    ///
    /// - `suffix` は空文字列ではない
    /// - `suffix` に使えるのは英小文字・数字・ハイフンのみ
    pub fn prefixed(
        service: &ServiceName,
        stage: &StageName,
        suffix: &str,
    ) -> Result<Self, DomainError> {
        if suffix.is_empty() {
            return Err(DomainError::Validation(
                "リソース名のサフィックスは必須です".to_string(),
            ));
        }

        if !suffix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(DomainError::Validation(format!(
                "リソース名のサフィックスに使えるのは英小文字・数字・ハイフンのみです: {suffix}"
            )));
        }

        Ok(Self(format!("{service}-{stage}-{suffix}")))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ResourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =========================================================================
// EmailAddress（メールアドレス）
// =========================================================================

/// メールアドレス（値オブジェクト）
///
/// 送信元アドレスと宛先アドレスの両方に使用する。
/// PII（個人識別情報）のため、Debug 出力はマスクされる。
///
/// # バリデーション
///
/// - `local@domain` 形式（`@` をちょうど 1 つ含む）
/// - ローカル部・ドメイン部ともに空ではない
///
/// # 外部前提条件
///
/// 送信元として使う場合、メール送信サブシステム側で検証済みの
/// アドレスであること。この前提はここでは検証しない（できない）。
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// メールアドレスを作成する
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation(format!(
                "メールアドレスの形式が不正です: {value}"
            )));
        };

        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(DomainError::Validation(format!(
                "メールアドレスの形式が不正です: {value}"
            )));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EmailAddress").field(&"[REDACTED]").finish()
    }
}

// =========================================================================
// ApplicationId（解決済みアプリケーション ID）
// =========================================================================

/// メッセージングアプリケーションの解決済み ID（値オブジェクト）
///
/// プロビジョニングエンジンがアプリケーション作成時に払い出す不透明な識別子。
/// メールチャネルとコンピュート関数の環境変数が下流で消費する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(String);

impl ApplicationId {
    /// 解決済み ID から作成する
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if value.trim().is_empty() {
            return Err(DomainError::Validation(
                "アプリケーション ID は必須です".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =========================================================================
// 解決済み ARN 各種
// =========================================================================

define_arn_string! {
    /// アクセスロールの解決済み ARN（値オブジェクト）
    pub struct RoleArn {
        label: "ロール ARN",
    }
}

define_arn_string! {
    /// コンピュート関数の解決済み ARN（値オブジェクト）
    pub struct FunctionArn {
        label: "関数 ARN",
    }
}

define_arn_string! {
    /// 検証済み送信元 ID の ARN（値オブジェクト）
    ///
    /// メール送信サブシステムで事前に検証されたドメインまたは
    /// アドレスを指す。検証自体はこのスタックのスコープ外。
    pub struct SenderIdentityArn {
        label: "送信元 ID の ARN",
    }
}

// =========================================================================
// EndpointUrl（解決済みエンドポイント URL）
// =========================================================================

/// エンドポイントの解決済み公開 URL（値オブジェクト）
///
/// デプロイ成果物として公開される URL。ルートセグメントを含まない
/// ベース URL であること（例: `https://abc123.execute-api.ap-northeast-1.amazonaws.com`）。
///
/// # バリデーション
///
/// - 絶対 URL としてパース可能
/// - スキームは `https`
/// - パス・クエリ・フラグメントを含まない
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointUrl(String);

impl EndpointUrl {
    /// 解決済み URL から作成する
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        let parsed = url::Url::parse(&value).map_err(|e| {
            DomainError::Validation(format!("エンドポイント URL のパースに失敗: {e}"))
        })?;

        if parsed.scheme() != "https" {
            return Err(DomainError::Validation(format!(
                "エンドポイント URL は https である必要があります: {value}"
            )));
        }

        if !matches!(parsed.path(), "" | "/") || parsed.query().is_some() || parsed.fragment().is_some()
        {
            return Err(DomainError::Validation(format!(
                "エンドポイント URL にパスやクエリを含めることはできません: {value}"
            )));
        }

        Ok(Self(value.trim_end_matches('/').to_string()))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for EndpointUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =========================================================================
// テスト
// =========================================================================
