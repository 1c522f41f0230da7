//! # デプロイ成果物の出力
//!
//! 解決済み属性を名前付きのデプロイ成果物として公開する宣言。
//! 値は参照先（エンドポイント）が完全に解決された後にのみ確定する。

use serde::Serialize;

use crate::graph::AttrRef;

/// デプロイ成果物の出力宣言
///
/// キーと、解決済み属性への参照の組。追加の加工は行わない。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputDecl {
    key:   String,
    value: AttrRef,
}

impl OutputDecl {
    /// 出力を宣言する
    pub fn new(key: impl Into<String>, value: AttrRef) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// 出力キーを取得する
    pub fn key(&self) -> &str {
        &self.key
    }

    /// 参照する属性を取得する
    pub fn value(&self) -> &AttrRef {
        &self.value
    }
}
