//! # メッセージングアプリケーションとメールチャネル
//!
//! 通知チャネルの論理的な名前空間（メッセージングアプリケーション）と、
//! 検証済み送信元 ID をそこに束ねるメールチャネルの宣言を定義する。
//!
//! ## ライフサイクル
//!
//! 1. メッセージングアプリケーションが作成され、不透明な ID が払い出される
//! 2. メールチャネルがその ID とアクセスロールの ARN を参照して作成される
//! 3. チャネルは作成と同時に有効化され、即座に送信可能になる
//!
//! ## 外部前提条件
//!
//! 送信元アドレスはメール送信サブシステム側で検証済みであること。
//! 未検証でもチャネルの宣言・プロビジョニングは成功するが、
//! 実行時のすべての送信が失敗する。この非対称性は意図したもので、
//! グラフ側では検出しない（できない）。

use serde::Serialize;

use crate::{
    graph::AttrRef,
    value_objects::{EmailAddress, ResourceName, SenderIdentityArn},
};

// =========================================================================
// MessagingAppDecl（メッセージングアプリケーション宣言）
// =========================================================================

/// メッセージングアプリケーションの宣言
///
/// 通知チャネルを束ねる論理的な名前空間。宣言グラフの葉であり、
/// 作成時に払い出される ID がメールチャネルと
/// コンピュート関数の環境変数から消費される。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessagingAppDecl {
    name: ResourceName,
}

impl MessagingAppDecl {
    /// メッセージングアプリケーションを宣言する
    pub fn new(name: ResourceName) -> Self {
        Self { name }
    }

    /// 物理名を取得する
    pub fn name(&self) -> &ResourceName {
        &self.name
    }
}

// =========================================================================
// EmailChannelDecl（メールチャネル宣言）
// =========================================================================

/// メールチャネルの宣言
///
/// メッセージングアプリケーションと検証済み送信元 ID の束縛。
/// アクセスロールを介して送信が認可される。
///
/// # 参照
///
/// - `application`: 所属するメッセージングアプリケーションの ID
/// - `role`: 送信を認可するアクセスロールの ARN
///
/// 両方が解決されるまでこのチャネルは作成されない。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailChannelDecl {
    application:  AttrRef,
    from_address: EmailAddress,
    identity:     SenderIdentityArn,
    role:         AttrRef,
    enabled:      bool,
}

impl EmailChannelDecl {
    /// メールチャネルを宣言する
    ///
    /// チャネルは宣言時点で有効（`enabled=true`）になり、
    /// プロビジョニング完了と同時に送信可能になる。
    pub fn new(
        application: AttrRef,
        from_address: EmailAddress,
        identity: SenderIdentityArn,
        role: AttrRef,
    ) -> Self {
        Self {
            application,
            from_address,
            identity,
            role,
            enabled: true,
        }
    }

    /// 所属するメッセージングアプリケーションへの参照を取得する
    pub fn application(&self) -> &AttrRef {
        &self.application
    }

    /// 送信元メールアドレスを取得する
    pub fn from_address(&self) -> &EmailAddress {
        &self.from_address
    }

    /// 検証済み送信元 ID の ARN を取得する
    pub fn identity(&self) -> &SenderIdentityArn {
        &self.identity
    }

    /// 送信を認可するアクセスロールへの参照を取得する
    pub fn role(&self) -> &AttrRef {
        &self.role
    }

    /// チャネルが有効かどうかを返す
    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

// =========================================================================
// テスト
// =========================================================================
