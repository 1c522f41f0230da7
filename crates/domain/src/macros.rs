/// リソース命名に使える String Newtype を定義する宣言型マクロ
///
/// 以下のボイラープレートを一括生成する:
/// - Newtype 構造体（`String` をラップ）
/// - `new()`: trim + 空チェック + 文字種チェック + 最大長チェック
/// - `as_str()`: 文字列参照
/// - `into_string()`: 所有権を持つ文字列に変換
/// - `Display` impl
///
/// # 文字種の制約
///
/// クラウドリソースの物理名に埋め込まれるため、使用できるのは
/// 英小文字・数字・ハイフンのみ（`[a-z0-9-]`）。
/// 先頭・末尾のハイフンは不可。
///
/// # 引数
///
/// - `$label`: エラーメッセージに使うラベル（例: `"サービス名"`）
/// - `$max_length`: 最大文字数
///
/// # 使用例
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use pinmail_domain::value_objects::ServiceName;
///
/// let name = ServiceName::new("acct")?;
/// assert_eq!(name.as_str(), "acct");
/// assert!(ServiceName::new("Acct").is_err());
/// # Ok(())
/// # }
/// ```
macro_rules! define_name_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident {
            label: $label:expr,
            max_length: $max_length:expr $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        $vis struct $Name(String);

        impl $Name {
            pub fn new(value: impl Into<String>) -> Result<Self, $crate::DomainError> {
                let value = value.into().trim().to_string();

                if value.is_empty() {
                    return Err($crate::DomainError::Validation(format!(
                        "{}は必須です",
                        $label
                    )));
                }

                if value.chars().count() > $max_length {
                    return Err($crate::DomainError::Validation(format!(
                        "{}は {} 文字以内である必要があります",
                        $label, $max_length
                    )));
                }

                if !value
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
                {
                    return Err($crate::DomainError::Validation(format!(
                        "{}に使えるのは英小文字・数字・ハイフンのみです: {}",
                        $label, value
                    )));
                }

                if value.starts_with('-') || value.ends_with('-') {
                    return Err($crate::DomainError::Validation(format!(
                        "{}の先頭・末尾にハイフンは使えません: {}",
                        $label, value
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

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// ARN を保持する String Newtype を定義する宣言型マクロ
///
/// プロビジョニングエンジンが解決した ARN を型安全に受け渡すための
/// Newtype を生成する。`arn:` で始まらない値は拒否する。
macro_rules! define_arn_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident {
            label: $label:expr $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        $vis struct $Name(String);

        impl $Name {
            pub fn new(value: impl Into<String>) -> Result<Self, $crate::DomainError> {
                let value = value.into().trim().to_string();

                if !value.starts_with("arn:") {
                    return Err($crate::DomainError::Validation(format!(
                        "{}は ARN 形式（arn: で始まる）である必要があります: {}",
                        $label, value
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

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}
