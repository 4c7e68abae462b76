//! # 共通値オブジェクト
//!
//! 複数のエンティティで共有される値オブジェクトを定義する。
//!
//! ## 含まれる型
//!
//! | 型 | ラップ対象 | 用途 |
//! |---|-----------|------|
//! | [`Version`] | `u32` | 楽観的ロック用のバージョン番号 |
//! | [`ApproverId`] | `String` | 承認者の不透明な識別子 |
//! | [`DocumentRef`] | `String` | 承認対象ドキュメントへの参照 |
//! | [`ProjectRef`] | `String` | ドキュメントが属するプロジェクトへの参照 |
//! | [`Priority`] | enum | 整数で順序付けられる優先度 |

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::DomainError;

// =========================================================================
// Version（バージョン番号）
// =========================================================================

/// バージョン番号（値オブジェクト）
///
/// ワークフローインスタンスの楽観的ロックに使用する。
/// 1 から始まり、アクションが受理されるたびにインクリメントされる。
///
/// ```rust
/// use shoninflow_domain::value_objects::Version;
///
/// let v1 = Version::initial();
/// assert_eq!(v1.as_u32(), 1);
/// assert_eq!(v1.next().as_u32(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version(u32);

impl Version {
    /// 初期バージョン（1）を作成する
    pub fn initial() -> Self {
        Self(1)
    }

    /// 指定した値からバージョンを作成する
    ///
    /// 0 は無効（バージョンは 1 以上）。
    pub fn new(value: u32) -> Result<Self, DomainError> {
        if value == 0 {
            return Err(DomainError::Validation(
                "バージョン番号は 1 以上である必要があります".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// 次のバージョンを返す
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// 内部の u32 値を取得する
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::initial()
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =========================================================================
// 識別子・参照
// =========================================================================

define_validated_string! {
    /// 承認者 ID
    ///
    /// エンジンは承認者を不透明な文字列として扱い、
    /// ユーザー管理や認証には関与しない。
    pub struct ApproverId {
        label: "承認者 ID",
        max_length: 128,
    }
}

define_validated_string! {
    /// 承認対象ドキュメントへの参照
    pub struct DocumentRef {
        label: "ドキュメント参照",
        max_length: 512,
    }
}

define_validated_string! {
    /// プロジェクト参照（承認待ち一覧の絞り込みに使う）
    pub struct ProjectRef {
        label: "プロジェクト参照",
        max_length: 128,
    }
}

// =========================================================================
// Priority（優先度）
// =========================================================================

/// 優先度
///
/// 整数値（1〜4）で表現され、値が大きいほど優先度が高い。
/// JSON でも整数としてシリアライズされる。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
)]
#[serde(try_from = "u8", into = "u8")]
#[strum(serialize_all = "snake_case")]
pub enum Priority {
    Low    = 1,
    #[default]
    Normal = 2,
    High   = 3,
    /// 承認待ち一覧で常に先頭に並ぶ
    Urgent = 4,
}

impl Priority {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Priority {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Low),
            2 => Ok(Self::Normal),
            3 => Ok(Self::High),
            4 => Ok(Self::Urgent),
            _ => Err(DomainError::Validation(format!(
                "不正な優先度: {value}（1〜4 で指定してください）"
            ))),
        }
    }
}

impl From<Priority> for u8 {
    fn from(value: Priority) -> Self {
        value.as_u8()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_versionは0を拒否する() {
        assert!(Version::new(0).is_err());
        assert_eq!(Version::new(3).unwrap().as_u32(), 3);
    }

    #[test]
    fn test_approver_idは前後の空白を除去する() {
        let approver = ApproverId::new("  pm-1  ").unwrap();

        assert_eq!(approver.as_str(), "pm-1");
        assert_eq!(approver.to_string(), "pm-1");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn test_approver_idは空文字を拒否する(#[case] input: &str) {
        let result = ApproverId::new(input);

        assert_eq!(
            result,
            Err(DomainError::Validation("承認者 IDは必須です".to_string()))
        );
    }

    #[test]
    fn test_approver_idは最大長を超えると拒否する() {
        let long = "a".repeat(129);

        assert!(ApproverId::new(long).is_err());
        assert!(ApproverId::new("a".repeat(128)).is_ok());
    }

    #[test]
    fn test_approver_idのデシリアライズでも検証される() {
        let result: Result<ApproverId, _> = serde_json::from_str(r#""  ""#);
        assert!(result.is_err());

        let approver: ApproverId = serde_json::from_str(r#"" dir-1 ""#).unwrap();
        assert_eq!(approver.as_str(), "dir-1");
    }

    #[test]
    fn test_priorityは整数の大小で順序付けられる() {
        assert!(Priority::Urgent > Priority::High);
        assert!(Priority::High > Priority::Normal);
        assert!(Priority::Normal > Priority::Low);
    }

    #[rstest]
    #[case(1, Priority::Low)]
    #[case(2, Priority::Normal)]
    #[case(3, Priority::High)]
    #[case(4, Priority::Urgent)]
    fn test_priorityは整数から変換できる(#[case] value: u8, #[case] expected: Priority) {
        assert_eq!(Priority::try_from(value).unwrap(), expected);
    }

    #[rstest]
    #[case(0)]
    #[case(5)]
    fn test_priorityは範囲外の整数を拒否する(#[case] value: u8) {
        assert!(Priority::try_from(value).is_err());
    }

    #[test]
    fn test_priorityはjsonで整数になる() {
        let json = serde_json::to_value(Priority::High).unwrap();
        assert_eq!(json, serde_json::json!(3));

        let priority: Priority = serde_json::from_value(serde_json::json!(4)).unwrap();
        assert_eq!(priority, Priority::Urgent);
    }
}
