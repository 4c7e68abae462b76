//! # ステータス導出
//!
//! ワークフローのステータスは保存された値ではなく、判断履歴から毎回導出する。
//!
//! | 条件 | ステータス |
//! |------|-----------|
//! | 却下が 1 件以上 | `Rejected` |
//! | 有効な必須承認者全員が承認 | `Approved` |
//! | 承認が 1 件以上 | `InReview` |
//! | 上記以外 | `Pending` |
//!
//! 却下はどの戦略でも即座に終了状態となる。

use super::{
    instance::{DecisionOutcome, WorkflowStatus},
    router::{ApprovalProgress, effective_required_approvers},
};

/// 判断履歴からステータスを導出する
pub fn derive_status(progress: &ApprovalProgress<'_>) -> WorkflowStatus {
    if progress.has_rejection() {
        return WorkflowStatus::Rejected;
    }

    let all_approved = effective_required_approvers(progress)
        .iter()
        .all(|a| progress.outcome_of(a) == Some(DecisionOutcome::Approved));
    if all_approved {
        return WorkflowStatus::Approved;
    }

    if progress.decisions.is_empty() {
        WorkflowStatus::Pending
    } else {
        WorkflowStatus::InReview
    }
}
