//! # コンピュート関数
//!
//! リクエストごとに同期呼び出しされるステートレスなハンドラの宣言を定義する。
//!
//! ## 環境変数コントラクト
//!
//! | 変数名 | 値 | 解決タイミング |
//! |--------|-----|---------------|
//! | `FROM_EMAIL` | 送信元メールアドレス | 設定から（リテラル） |
//! | `APP_ID` | メッセージングアプリケーションの ID | デプロイ時（属性参照） |
//!
//! 上流エンティティの出力に由来する値はリテラルでの埋め込みを許さず、
//! 属性参照（[`EnvValue::Attr`]）として宣言する。
//!
//! ## ハンドラの扱い
//!
//! ハンドラ内部のメール整形ロジックはこのグラフのスコープ外。
//! [`HandlerRef`] はコード成果物への不透明な参照としてエンジンへ渡される。

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{
    graph::{AttrRef, EnvValue},
    value_objects::ResourceName,
};

/// 送信元メールアドレスを渡す環境変数名
pub const ENV_FROM_EMAIL: &str = "FROM_EMAIL";

/// メッセージングアプリケーション ID を渡す環境変数名
pub const ENV_APP_ID: &str = "APP_ID";

// =========================================================================
// HandlerRef（コード成果物への参照）
// =========================================================================

/// コード成果物への不透明な参照
///
/// グラフはこの中身を解釈しない。エンジンが成果物をそのまま
/// コンピュート基盤へ引き渡す。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerRef {
    /// コード成果物（zip）のパス
    pub artifact: PathBuf,
    /// エントリポイント（例: `index.handler`）
    pub handler:  String,
    /// 実行ランタイムの識別子（例: `nodejs22.x`）
    pub runtime:  String,
}

impl HandlerRef {
    /// コード成果物への参照を作成する
    pub fn new(artifact: impl Into<PathBuf>, handler: impl Into<String>, runtime: impl Into<String>) -> Self {
        Self {
            artifact: artifact.into(),
            handler:  handler.into(),
            runtime:  runtime.into(),
        }
    }

    /// 成果物のパスを取得する
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }
}

// =========================================================================
// ComputeFunctionDecl（コンピュート関数宣言）
// =========================================================================

/// コンピュート関数の宣言
///
/// アクセスロールの下で実行されるステートレスなハンドラ。
/// 呼び出しコントラクト（リクエスト/レスポンスの形）は
/// [`crate::invocation`] が境界として定義し、内部ロジックはスコープ外。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputeFunctionDecl {
    name:        ResourceName,
    handler:     HandlerRef,
    role:        AttrRef,
    environment: BTreeMap<String, EnvValue>,
}

impl ComputeFunctionDecl {
    /// コンピュート関数を宣言する
    pub fn new(
        name: ResourceName,
        handler: HandlerRef,
        role: AttrRef,
        environment: BTreeMap<String, EnvValue>,
    ) -> Self {
        Self {
            name,
            handler,
            role,
            environment,
        }
    }

    /// 物理名を取得する
    pub fn name(&self) -> &ResourceName {
        &self.name
    }

    /// コード成果物への参照を取得する
    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    /// 実行ロールへの参照を取得する
    pub fn role(&self) -> &AttrRef {
        &self.role
    }

    /// 環境変数の宣言を取得する
    pub fn environment(&self) -> &BTreeMap<String, EnvValue> {
        &self.environment
    }
}

// =========================================================================
// テスト
// =========================================================================
