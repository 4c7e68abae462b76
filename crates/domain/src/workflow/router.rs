//! # 承認ルーティング
//!
//! 現時点で誰が承認アクションを行えるかを決める。
//!
//! ルーティングはインスタンス全体ではなく [`ApprovalProgress`]（戦略・必須承認者・
//! 判断履歴・ドキュメント属性の借用ビュー）に対して計算する。
//! ステータス導出（[`super::status`]）も同じビューを使う。
//!
//! 返す承認者の並びは常に必須承認者の定義順で、重複を含まない。

use serde_json::Value as JsonValue;

use super::{
    instance::{ApproverDecision, DecisionOutcome},
    strategy::RoutingStrategy,
};
use crate::value_objects::ApproverId;

/// ルーティングとステータス導出の入力
#[derive(Debug, Clone, Copy)]
pub struct ApprovalProgress<'a> {
    pub strategy:            &'a RoutingStrategy,
    pub required_approvers:  &'a [ApproverId],
    pub decisions:           &'a [ApproverDecision],
    pub document_attributes: &'a JsonValue,
}

impl ApprovalProgress<'_> {
    pub fn outcome_of(&self, approver: &ApproverId) -> Option<DecisionOutcome> {
        self.decisions
            .iter()
            .find(|d| &d.approver == approver)
            .map(|d| d.outcome)
    }

    pub fn has_rejection(&self) -> bool {
        self.decisions
            .iter()
            .any(|d| d.outcome == DecisionOutcome::Rejected)
    }
}

/// 承認完了に必要な承認者
///
/// - `Sequential` / `Parallel`: 必須承認者全員
/// - `Conditional`: 一致したルールの承認者の和集合（必須承認者の定義順）。
///   どのルールにも一致しなければ必須承認者全員
pub fn effective_required_approvers(progress: &ApprovalProgress<'_>) -> Vec<ApproverId> {
    let RoutingStrategy::Conditional { rules } = progress.strategy else {
        return progress.required_approvers.to_vec();
    };

    let matched: Vec<&ApproverId> = rules
        .iter()
        .filter(|rule| rule.matches(progress.document_attributes))
        .flat_map(|rule| rule.approvers.iter())
        .collect();

    if matched.is_empty() {
        return progress.required_approvers.to_vec();
    }

    progress
        .required_approvers
        .iter()
        .filter(|a| matched.contains(a))
        .cloned()
        .collect()
}

/// 現時点でアクション可能な承認者
///
/// 却下済み、または全員承認済みの場合は空になる。
pub fn eligible_approvers(progress: &ApprovalProgress<'_>) -> Vec<ApproverId> {
    if progress.has_rejection() {
        return Vec::new();
    }

    let mut pending = effective_required_approvers(progress)
        .into_iter()
        .filter(|a| progress.outcome_of(a).is_none());

    match progress.strategy {
        RoutingStrategy::Sequential => pending.next().into_iter().collect(),
        RoutingStrategy::Parallel | RoutingStrategy::Conditional { .. } => pending.collect(),
    }
}
