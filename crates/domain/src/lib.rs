//! # PinMail ドメイン層
//!
//! メール送信サービスを構成するインフラエンティティの宣言モデルを定義する。
//!
//! ## 設計方針
//!
//! このクレートが扱うのは実行時オブジェクトではなく「リソース宣言」である:
//!
//! - **エンティティ宣言**: 明示的な参照フィールドで結ばれた純粋なデータレコード
//!   （例: [`role::AccessRoleDecl`], [`messaging::EmailChannelDecl`]）
//! - **参照グラフ**: 論理 ID と属性参照による厳密な DAG（[`graph`]）
//! - **合成ルート**: グラフ全体を所有し、単一の合成関数で解決可能な
//!   宣言集合を生成する（[`stack::EmailServiceStack`]）
//! - **ドメインエラー**: 宣言時に検出される違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! deployer → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（クラウド SDK、プロビジョニングエンジン）には
//! 一切依存しない。宣言の解決はエンジンの責務であり、このクレートは
//! 「何を作るか」だけを表現する。
//!
//! ## モジュール構成
//!
//! - [`error`] - 宣言時に検出されるエラーの定義
//! - [`value_objects`] - 検証付きの共通値オブジェクト
//! - [`graph`] - 論理 ID・属性参照・宣言集合と DAG 検証
//! - [`role`] - アクセスロールとポリシードキュメント
//! - [`messaging`] - メッセージングアプリケーションとメールチャネル
//! - [`function`] - コンピュート関数と環境変数コントラクト
//! - [`endpoint`] - HTTP エンドポイント・ルート・CORS ポリシー
//! - [`output`] - デプロイ成果物の出力
//! - [`invocation`] - 呼び出し境界のリクエスト/レスポンス型
//! - [`stack`] - 合成ルートとスタック設定
//!
//! ## 使用例
//!
//! ```rust
//! use pinmail_domain::{
//!     function::HandlerRef,
//!     stack::{EmailServiceStack, StackConfig},
//!     value_objects::{EmailAddress, Region, SenderIdentityArn, ServiceName, StageName},
//! };
//!
//! # fn main() -> Result<(), pinmail_domain::DomainError> {
//! let config = StackConfig::new(
//!     ServiceName::new("acct")?,
//!     StageName::new("dev")?,
//!     Region::new("ap-northeast-1")?,
//!     EmailAddress::new("noreply@example.com")?,
//!     SenderIdentityArn::new("arn:aws:ses:ap-northeast-1:123456789012:identity/example.com")?,
//!     HandlerRef::new("dist/handler.zip", "index.handler", "nodejs22.x"),
//! );
//!
//! let stack = EmailServiceStack::declare(&config)?;
//! assert_eq!(stack.resources().count(), 5);
//! # Ok(())
//! # }
//! ```

#[macro_use]
mod macros;

pub mod endpoint;
pub mod error;
pub mod function;
pub mod graph;
pub mod invocation;
pub mod messaging;
pub mod output;
pub mod role;
pub mod stack;
pub mod value_objects;

pub use error::DomainError;
