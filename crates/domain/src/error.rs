//! # ドメイン層エラー定義
//!
//! リソース宣言の組み立てと検証で発生するエラー型。
//!
//! ## 設計方針
//!
//! - **型による分類**: エラーの種類を列挙型で明示し、パターンマッチで処理可能に
//! - **thiserror 活用**: `#[error(...)]` マクロでエラーメッセージを自動生成
//! - **宣言時検出**: ここで定義するエラーはすべて「宣言エラー」であり、
//!   リソースが 1 つも作成される前に検出される
//!
//! ## エラーの種類
//!
//! | エラー種別 | 用途 |
//! |-----------|------|
//! | `Validation` | 属性値の検証失敗（空文字列、不正な形式など） |
//! | `UnknownReference` | 宣言されていないエンティティへの参照 |
//! | `AttributeMismatch` | 参照先のエンティティ種別と属性が一致しない |
//! | `ReferenceCycle` | 参照グラフに循環が存在する |
//! | `DuplicateLogicalId` | 論理 ID の重複宣言 |

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// リソース宣言の組み立て・検証中に発生する例外状態を表現する。
/// このエラーが返った時点ではまだ何もプロビジョニングされていない。
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 属性値が宣言の制約に違反している場合に使用する。
    ///
    /// # 例
    ///
    /// - サービス名が空文字列
    /// - メールアドレスの形式不正
    /// - エンドポイント URL が https でない
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// 宣言されていないエンティティへの参照
    ///
    /// 参照元の論理 ID と、見つからなかった参照先の論理 ID を保持する。
    #[error("{from} が未宣言のエンティティを参照しています: {to}")]
    UnknownReference {
        /// 参照元の論理 ID
        from: String,
        /// 見つからなかった参照先の論理 ID
        to:   String,
    },

    /// 参照先のエンティティ種別と属性の不一致
    ///
    /// 例: メッセージングアプリケーション以外に `ApplicationId` 属性を要求した場合。
    #[error("{target} は属性 {attribute} を解決できません（種別: {kind}）")]
    AttributeMismatch {
        /// 参照先の論理 ID
        target:    String,
        /// 要求された属性名
        attribute: String,
        /// 参照先の実際のエンティティ種別
        kind:      String,
    },

    /// 参照グラフの循環
    ///
    /// リソース宣言は厳密な DAG でなければならない。
    #[error("リソース参照に循環があります: {0}")]
    ReferenceCycle(String),

    /// 論理 ID の重複宣言
    #[error("論理 ID が重複しています: {0}")]
    DuplicateLogicalId(String),
}
