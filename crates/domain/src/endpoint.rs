//! # HTTP エンドポイント
//!
//! 公開 HTTP サーフェスの宣言を定義する。
//!
//! ## コントラクト
//!
//! - ルートはちょうど 1 つ: `POST /send-email`
//! - CORS は任意オリジンからの POST を許可、ヘッダーは `Content-Type` のみ、
//!   クレデンシャルは不可
//! - 認証・レート制限・追加ルートは宣言しない
//!
//! インテグレーション（[`RouteDecl::integration`]）が、受信 HTTP リクエストを
//! コンピュート関数の呼び出しへ変換する唯一の機構になる。

use serde::Serialize;
use strum::IntoStaticStr;

use crate::{graph::AttrRef, value_objects::ResourceName};

/// 送信ルートのパス
pub const SEND_EMAIL_PATH: &str = "/send-email";

// =========================================================================
// HttpMethod（HTTP メソッド）
// =========================================================================

/// ルートが受け付ける HTTP メソッド
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, IntoStaticStr, strum::Display,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
}

// =========================================================================
// CorsPolicy（CORS ポリシー）
// =========================================================================

/// CORS ポリシー
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorsPolicy {
    /// 許可するリクエストヘッダー
    pub allow_headers:     Vec<String>,
    /// 許可するメソッド
    pub allow_methods:     Vec<HttpMethod>,
    /// クレデンシャル付きリクエストの可否
    pub allow_credentials: bool,
    /// 許可するオリジン
    pub allow_origins:     Vec<String>,
}

impl CorsPolicy {
    /// 任意オリジンからのクレデンシャルなし POST だけを許可するポリシー
    ///
    /// 許可ヘッダーは `Content-Type` のみ。
    pub fn public_post() -> Self {
        Self {
            allow_headers:     vec!["Content-Type".to_string()],
            allow_methods:     vec![HttpMethod::Post],
            allow_credentials: false,
            allow_origins:     vec!["*".to_string()],
        }
    }
}

// =========================================================================
// RouteDecl（ルート宣言）
// =========================================================================

/// ルートの宣言
///
/// (メソッド, パス) とインテグレーション先の組。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteDecl {
    method:      HttpMethod,
    path:        String,
    integration: AttrRef,
}

impl RouteDecl {
    /// ルートを宣言する
    pub fn new(method: HttpMethod, path: impl Into<String>, integration: AttrRef) -> Self {
        Self {
            method,
            path: path.into(),
            integration,
        }
    }

    /// HTTP メソッドを取得する
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// パスを取得する
    pub fn path(&self) -> &str {
        &self.path
    }

    /// インテグレーション先（コンピュート関数）への参照を取得する
    pub fn integration(&self) -> &AttrRef {
        &self.integration
    }

    /// `{METHOD} {path}` 形式のルートキーを返す
    pub fn route_key(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

// =========================================================================
// HttpEndpointDecl（HTTP エンドポイント宣言）
// =========================================================================

/// HTTP エンドポイントの宣言
///
/// 公開 API サーフェス。解決されると公開 URL
/// （[`crate::graph::Attribute::EndpointUrl`]）を提供する。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpEndpointDecl {
    name:        ResourceName,
    description: String,
    cors:        CorsPolicy,
    routes:      Vec<RouteDecl>,
}

impl HttpEndpointDecl {
    /// HTTP エンドポイントを宣言する
    pub fn new(
        name: ResourceName,
        description: impl Into<String>,
        cors: CorsPolicy,
        routes: Vec<RouteDecl>,
    ) -> Self {
        Self {
            name,
            description: description.into(),
            cors,
            routes,
        }
    }

    /// 物理名を取得する
    pub fn name(&self) -> &ResourceName {
        &self.name
    }

    /// 説明を取得する
    pub fn description(&self) -> &str {
        &self.description
    }

    /// CORS ポリシーを取得する
    pub fn cors(&self) -> &CorsPolicy {
        &self.cors
    }

    /// ルートを取得する
    pub fn routes(&self) -> &[RouteDecl] {
        &self.routes
    }
}

// =========================================================================
// テスト
// =========================================================================
