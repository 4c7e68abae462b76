//! # 承認待ちスケジューリング
//!
//! 未完了インスタンスの経過日数・SLA 超過を算出し、処理すべき順に並べる。
//!
//! ## 並び順
//!
//! 1. `Urgent` 優先度
//! 2. 完了予定日時を超過しているもの
//! 3. 優先度の高い順
//! 4. 作成日時の古い順
//! 5. インスタンス ID（同順位の並びを決定的にする）

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use super::instance::WorkflowInstance;
use crate::value_objects::{ApproverId, Priority};

/// 承認待ち一覧の 1 件
#[derive(Debug, Clone, PartialEq)]
pub struct PendingApprovalView {
    pub instance: WorkflowInstance,
    pub eligible_approvers: Vec<ApproverId>,
    /// 作成からの経過日数（切り捨て）
    pub age_in_days: i64,
    /// 完了予定日時までの日数（超過時は負、予定日時がなければ `None`）
    pub days_until_estimated_completion: Option<i64>,
    pub is_overdue: bool,
}

impl PendingApprovalView {
    pub fn new(instance: WorkflowInstance, now: DateTime<Utc>) -> Self {
        let age_in_days = (now - instance.created_at()).num_days().max(0);
        let estimated = instance.estimated_completion_at();
        let days_until_estimated_completion = estimated.map(|at| (at - now).num_days());
        let is_overdue = !instance.is_terminal() && estimated.is_some_and(|at| now > at);

        Self {
            eligible_approvers: instance.eligible_approvers(),
            instance,
            age_in_days,
            days_until_estimated_completion,
            is_overdue,
        }
    }

    fn is_urgent(&self) -> bool {
        self.instance.priority() == Priority::Urgent
    }

    fn queue_order(&self, other: &Self) -> Ordering {
        other
            .is_urgent()
            .cmp(&self.is_urgent())
            .then_with(|| other.is_overdue.cmp(&self.is_overdue))
            .then_with(|| other.instance.priority().cmp(&self.instance.priority()))
            .then_with(|| self.instance.created_at().cmp(&other.instance.created_at()))
            .then_with(|| self.instance.id().cmp(other.instance.id()))
    }
}

/// インスタンスを承認待ちビューに変換し、処理順に並べる
pub fn prioritize(
    instances: impl IntoIterator<Item = WorkflowInstance>,
    now: DateTime<Utc>,
) -> Vec<PendingApprovalView> {
    let mut views: Vec<PendingApprovalView> = instances
        .into_iter()
        .map(|instance| PendingApprovalView::new(instance, now))
        .collect();
    views.sort_by(PendingApprovalView::queue_order);
    views
}
