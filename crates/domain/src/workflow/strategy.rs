//! # ルーティング戦略
//!
//! 承認者の順序付けを決める戦略と、`Conditional` 戦略で使う条件ルールを定義する。
//!
//! - `Sequential`: 必須承認者を定義順に 1 人ずつ
//! - `Parallel`: 必須承認者全員が任意の順序で
//! - `Conditional`: ドキュメント属性に一致したルールの承認者だけが任意の順序で
//!
//! 戦略は閉じたタグ付き列挙型であり、ルールは `Conditional` の場合にのみ存在する。

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use strum::IntoStaticStr;

use crate::{DomainError, value_objects::ApproverId};

/// 戦略の種別（ルールを含まない判別子）
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StrategyKind {
    Sequential,
    Parallel,
    Conditional,
}

impl std::str::FromStr for StrategyKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequential" => Ok(Self::Sequential),
            "parallel" => Ok(Self::Parallel),
            "conditional" => Ok(Self::Conditional),
            _ => Err(DomainError::Validation(format!("不正なルーティング戦略: {s}"))),
        }
    }
}

/// ルーティング戦略
///
/// JSON 表現は `{"type": "sequential"}` / `{"type": "conditional", "rules": [...]}`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoutingStrategy {
    Sequential,
    Parallel,
    Conditional { rules: Vec<ConditionalRule> },
}

impl RoutingStrategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Sequential => StrategyKind::Sequential,
            Self::Parallel => StrategyKind::Parallel,
            Self::Conditional { .. } => StrategyKind::Conditional,
        }
    }

    /// 条件ルール（`Conditional` 以外では空）
    pub fn rules(&self) -> &[ConditionalRule] {
        match self {
            Self::Conditional { rules } => rules,
            Self::Sequential | Self::Parallel => &[],
        }
    }

    /// ルールが参照する承認者がすべて `required` に含まれることを検証する
    pub(crate) fn validate_against(&self, required: &[ApproverId]) -> Result<(), DomainError> {
        for rule in self.rules() {
            if rule.attribute.trim().is_empty() {
                return Err(DomainError::Validation(
                    "条件ルールの属性名は必須です".to_string(),
                ));
            }
            if rule.approvers.is_empty() {
                return Err(DomainError::Validation(format!(
                    "条件ルール（属性: {}）には承認者が 1 人以上必要です",
                    rule.attribute
                )));
            }
            if let Some(unknown) = rule.approvers.iter().find(|a| !required.contains(a)) {
                return Err(DomainError::Validation(format!(
                    "条件ルールの承認者 {unknown} が必須承認者に含まれていません"
                )));
            }
        }
        Ok(())
    }

    /// 委任時に承認者を差し替えた戦略を返す
    pub(crate) fn with_approver_replaced(self, from: &ApproverId, to: &ApproverId) -> Self {
        match self {
            Self::Conditional { rules } => Self::Conditional {
                rules: rules
                    .into_iter()
                    .map(|rule| rule.with_approver_replaced(from, to))
                    .collect(),
            },
            other => other,
        }
    }
}

/// 条件ルールの比較演算子
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RuleOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// `value` は配列で、属性値がその要素のいずれかと等しい
    In,
}

/// 条件ルール
///
/// ドキュメント属性 `attribute` が `operator` / `value` に一致した場合、
/// `approvers` が承認対象に加わる。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalRule {
    pub attribute: String,
    pub operator:  RuleOperator,
    pub value:     JsonValue,
    pub approvers: Vec<ApproverId>,
}

impl ConditionalRule {
    /// ドキュメント属性がこのルールに一致するか
    ///
    /// 属性が存在しない場合は演算子に関わらず一致しない。
    /// 大小比較は両辺が数値のとき、または両辺が文字列のときのみ成立する。
    pub fn matches(&self, attributes: &JsonValue) -> bool {
        let Some(actual) = attributes.get(&self.attribute) else {
            return false;
        };

        match self.operator {
            RuleOperator::Eq => values_equal(actual, &self.value),
            RuleOperator::Ne => !values_equal(actual, &self.value),
            RuleOperator::Gt => compare(actual, &self.value).is_some_and(|o| o.is_gt()),
            RuleOperator::Gte => compare(actual, &self.value).is_some_and(|o| o.is_ge()),
            RuleOperator::Lt => compare(actual, &self.value).is_some_and(|o| o.is_lt()),
            RuleOperator::Lte => compare(actual, &self.value).is_some_and(|o| o.is_le()),
            RuleOperator::In => self
                .value
                .as_array()
                .is_some_and(|candidates| candidates.iter().any(|c| values_equal(actual, c))),
        }
    }

    fn with_approver_replaced(self, from: &ApproverId, to: &ApproverId) -> Self {
        Self {
            approvers: self
                .approvers
                .into_iter()
                .map(|a| if &a == from { to.clone() } else { a })
                .collect(),
            ..self
        }
    }
}

/// 数値は `1` と `1.0` を同一視する
fn values_equal(left: &JsonValue, right: &JsonValue) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(l), Some(r)) => l == r,
        _ => left == right,
    }
}

fn compare(left: &JsonValue, right: &JsonValue) -> Option<std::cmp::Ordering> {
    if let (Some(l), Some(r)) = (left.as_f64(), right.as_f64()) {
        return l.partial_cmp(&r);
    }
    match (left.as_str(), right.as_str()) {
        (Some(l), Some(r)) => Some(l.cmp(r)),
        _ => None,
    }
}
