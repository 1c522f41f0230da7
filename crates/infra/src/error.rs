//! # インフラ層エラー定義
//!
//! プロビジョニングエンジンとクラウド制御プレーンの通信で発生する
//! エラーを表現する。
//!
//! ## 設計方針
//!
//! - **全体失敗**: プロビジョニングエラーはグラフ解決全体を中断する。
//!   局所的なリカバリはこの層では行わない
//! - **ドメインエラーとの分離**: 宣言エラー（`DomainError`）は
//!   `Declaration` バリアントとしてラップし、発生箇所を区別可能にする
//! - **SpanTrace 自動捕捉**: `From` 実装や convenience constructor で
//!   エラー生成時の呼び出し経路を自動記録する
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターンを採用:
//! - [`InfraError`]: エラー種別（[`InfraErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`InfraErrorKind`]: エラーの具体的な種別（Iam, Pinpoint, Lambda 等）

use std::fmt;

use derive_more::Display;
use pinmail_domain::DomainError;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層で発生するエラー
///
/// エラー種別（[`InfraErrorKind`]）と [`SpanTrace`]（呼び出し経路）を保持する。
/// `From<DomainError>` の変換や convenience constructor でエラーを生成すると、
/// その時点のスパン情報が自動的にキャプチャされる。
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
///
/// クラウド SDK のエラー型はジェネリクスが深く `#[from]` が困難なため、
/// サービス別のバリアントへ手動で String にマップする。
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// 宣言エラー
    ///
    /// エンジンに渡された宣言集合が検証に通らなかった。
    /// リソースは 1 つも作成されていない。
    #[error("宣言エラー: {0}")]
    Declaration(#[source] DomainError),

    /// IAM 操作エラー（ロール作成、ポリシー添付）
    #[error("IAM エラー: {0}")]
    Iam(String),

    /// Pinpoint 操作エラー（アプリケーション作成、チャネル有効化）
    #[error("Pinpoint エラー: {0}")]
    Pinpoint(String),

    /// Lambda 操作エラー（関数作成、権限付与）
    #[error("Lambda エラー: {0}")]
    Lambda(String),

    /// API Gateway 操作エラー（API・ルート・インテグレーション作成）
    #[error("API Gateway エラー: {0}")]
    ApiGateway(String),

    /// SES 操作エラー（送信元 ID の検証状態確認）
    #[error("SES エラー: {0}")]
    Ses(String),

    /// コード成果物の読み込みエラー
    #[error("コード成果物の読み込みに失敗: {0}")]
    Artifact(#[source] std::io::Error),

    /// 属性解決エラー
    ///
    /// 参照された属性が解決済み集合に存在しない。
    /// 宣言検証を通過した集合では発生しない想定。
    #[error("属性を解決できません: {0}")]
    Resolution(String),

    /// 予期しないエラー
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

// ===== InfraError のメソッド =====

impl InfraError {
    /// エラー種別を取得する
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    /// SpanTrace を取得する
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// InfraError を分解して InfraErrorKind と SpanTrace を取り出す
    pub fn into_parts(self) -> (InfraErrorKind, SpanTrace) {
        (self.kind, self.span_trace)
    }

    // ===== Convenience constructors =====

    /// IAM エラーを生成する
    pub fn iam(msg: impl Into<String>) -> Self {
        Self::capture(InfraErrorKind::Iam(msg.into()))
    }

    /// Pinpoint エラーを生成する
    pub fn pinpoint(msg: impl Into<String>) -> Self {
        Self::capture(InfraErrorKind::Pinpoint(msg.into()))
    }

    /// Lambda エラーを生成する
    pub fn lambda(msg: impl Into<String>) -> Self {
        Self::capture(InfraErrorKind::Lambda(msg.into()))
    }

    /// API Gateway エラーを生成する
    pub fn api_gateway(msg: impl Into<String>) -> Self {
        Self::capture(InfraErrorKind::ApiGateway(msg.into()))
    }

    /// SES エラーを生成する
    pub fn ses(msg: impl Into<String>) -> Self {
        Self::capture(InfraErrorKind::Ses(msg.into()))
    }

    /// コード成果物の読み込みエラーを生成する
    pub fn artifact(source: std::io::Error) -> Self {
        Self::capture(InfraErrorKind::Artifact(source))
    }

    /// 属性解決エラーを生成する
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::capture(InfraErrorKind::Resolution(msg.into()))
    }

    /// 予期しないエラーを生成する
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::capture(InfraErrorKind::Unexpected(msg.into()))
    }

    fn capture(kind: InfraErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }
}

// ===== トレイト実装 =====

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

// ===== From 実装（SpanTrace 自動キャプチャ） =====

impl From<DomainError> for InfraError {
    fn from(source: DomainError) -> Self {
        Self::capture(InfraErrorKind::Declaration(source))
    }
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::layer::SubscriberExt as _;

    use super::*;

    /// テスト用に ErrorLayer 付き subscriber を設定する
    fn with_error_layer(f: impl FnOnce()) {
        let subscriber = tracing_subscriber::registry().with(tracing_error::ErrorLayer::default());
        let _guard = tracing::subscriber::set_default(subscriber);
        f();
    }

    // ===== From 実装のテスト =====

    #[test]
    fn test_from_domain_errorでspan_traceがキャプチャされる() {
        with_error_layer(|| {
            let span = tracing::info_span!("test_resolve");
            let _enter = span.enter();

            let domain_err = DomainError::Validation("サービス名は必須です".to_string());
            let err: InfraError = domain_err.into();

            assert!(matches!(err.kind(), InfraErrorKind::Declaration(_)));
            let trace_str = format!("{}", err.span_trace());
            assert!(
                trace_str.contains("test_resolve"),
                "SpanTrace がスパン名を含むこと: {trace_str}",
            );
        });
    }

    // ===== Convenience constructor のテスト =====

    #[test]
    fn test_iamでspan_traceがキャプチャされる() {
        with_error_layer(|| {
            let span = tracing::info_span!("test_create_role");
            let _enter = span.enter();

            let err = InfraError::iam("ロール作成に失敗");

            assert!(matches!(err.kind(), InfraErrorKind::Iam(msg) if msg == "ロール作成に失敗"));
            let trace_str = format!("{}", err.span_trace());
            assert!(trace_str.contains("test_create_role"));
        });
    }

    #[test]
    fn test_resolutionでエラー種別が設定される() {
        with_error_layer(|| {
            let err = InfraError::resolution("messaging-app の application_id");
            assert!(matches!(err.kind(), InfraErrorKind::Resolution(_)));
        });
    }

    // ===== Display / source のテスト =====

    #[test]
    fn test_displayがinfra_error_kindのメッセージを出力する() {
        let err = InfraError::pinpoint("チャネル有効化に失敗");
        assert_eq!(format!("{err}"), "Pinpoint エラー: チャネル有効化に失敗");
    }

    #[test]
    fn test_sourceがinfra_error_kindに委譲する() {
        use std::error::Error;

        let domain_err = DomainError::Validation("テスト".to_string());
        let err: InfraError = domain_err.into();

        // Declaration バリアントは DomainError を source として持つ
        assert!(err.source().is_some());
    }
}
