//! # 呼び出しコントラクト
//!
//! HTTP エンドポイント経由でコンピュート関数に届くリクエストと、
//! 関数が返すレスポンスの境界型を定義する。
//!
//! ハンドラ内部の整形・送信ロジックはスコープ外であり、
//! ここで定義するのは入出力の形だけ。実行時エラー
//! （未検証の送信元 ID による配送失敗など）はプロビジョニングでは
//! 検出されず、レスポンスのステータスとしてのみ報告される。

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::value_objects::EmailAddress;

/// メール送信リクエスト
///
/// `POST /send-email` のリクエストボディ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendEmailRequest {
    /// 宛先メールアドレス
    pub to:      EmailAddress,
    /// 件名
    pub subject: String,
    /// 本文
    pub body:    String,
}

/// 配送ステータス
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum DeliveryStatus {
    /// 送信に成功した
    Sent,
    /// 送信に失敗した
    Failed,
}

/// メール送信レスポンス
///
/// 配送失敗は必ず `Failed` として報告される。
/// 沈黙の成功（失敗を `Sent` として返すこと）は許されない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendEmailResponse {
    /// 配送ステータス
    pub status:     DeliveryStatus,
    /// 送信に成功した場合のメッセージ ID
    pub message_id: Option<String>,
    /// 失敗した場合の理由
    pub reason:     Option<String>,
}

impl SendEmailResponse {
    /// 成功レスポンスを作成する
    pub fn sent(message_id: impl Into<String>) -> Self {
        Self {
            status:     DeliveryStatus::Sent,
            message_id: Some(message_id.into()),
            reason:     None,
        }
    }

    /// 失敗レスポンスを作成する
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status:     DeliveryStatus::Failed,
            message_id: None,
            reason:     Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_成功レスポンスはメッセージidを持つ() {
        let response = SendEmailResponse::sent("msg-001");

        assert_eq!(response.status, DeliveryStatus::Sent);
        assert_eq!(response.message_id.as_deref(), Some("msg-001"));
        assert_eq!(response.reason, None);
    }

    #[test]
    fn test_失敗レスポンスは理由を持つ() {
        let response = SendEmailResponse::failed("送信元 ID が未検証です");

        assert_eq!(response.status, DeliveryStatus::Failed);
        assert_eq!(response.message_id, None);
        assert!(response.reason.is_some());
    }

    #[test]
    fn test_配送ステータスの文字列表現はsnake_case() {
        assert_eq!(DeliveryStatus::Sent.to_string(), "sent");
        assert_eq!(DeliveryStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_リクエストはjsonから復元できる() {
        let json = r#"{"to":"user@example.com","subject":"件名","body":"本文"}"#;
        let request: SendEmailRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.to.as_str(), "user@example.com");
        assert_eq!(request.subject, "件名");
    }
}
