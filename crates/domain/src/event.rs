//! # ワークフローイベント
//!
//! アクションがコミットされた後に外部へ配信されるイベントを定義する。
//!
//! | バリアント | 発生条件 |
//! |-----------|---------|
//! | `ApprovalRequested` | 新たに承認可能者になった承認者がいる |
//! | `StepApproved` | 承認者 1 人の承認が記録された |
//! | `Approved` | ワークフローが承認完了した |
//! | `Rejected` | ワークフローが却下された |
//! | `Delegated` | 承認者が委任した |
//! | `Commented` | コメントが投稿された |
//!
//! 配信は fire-and-forget であり、配信失敗はアクションの結果に影響しない。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{value_objects::ApproverId, workflow::WorkflowInstanceId};

/// イベント種別
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkflowEventType {
    ApprovalRequested,
    StepApproved,
    Approved,
    Rejected,
    Delegated,
    Commented,
}

/// ワークフローイベント
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    ApprovalRequested {
        workflow_id: WorkflowInstanceId,
        approvers:   Vec<ApproverId>,
        occurred_at: DateTime<Utc>,
    },
    StepApproved {
        workflow_id: WorkflowInstanceId,
        approver:    ApproverId,
        occurred_at: DateTime<Utc>,
    },
    Approved {
        workflow_id: WorkflowInstanceId,
        occurred_at: DateTime<Utc>,
    },
    Rejected {
        workflow_id: WorkflowInstanceId,
        approver:    ApproverId,
        reason:      String,
        occurred_at: DateTime<Utc>,
    },
    Delegated {
        workflow_id: WorkflowInstanceId,
        from:        ApproverId,
        to:          ApproverId,
        occurred_at: DateTime<Utc>,
    },
    Commented {
        workflow_id: WorkflowInstanceId,
        actor:       ApproverId,
        occurred_at: DateTime<Utc>,
    },
}

impl WorkflowEvent {
    pub fn event_type(&self) -> WorkflowEventType {
        match self {
            Self::ApprovalRequested { .. } => WorkflowEventType::ApprovalRequested,
            Self::StepApproved { .. } => WorkflowEventType::StepApproved,
            Self::Approved { .. } => WorkflowEventType::Approved,
            Self::Rejected { .. } => WorkflowEventType::Rejected,
            Self::Delegated { .. } => WorkflowEventType::Delegated,
            Self::Commented { .. } => WorkflowEventType::Commented,
        }
    }

    pub fn workflow_id(&self) -> &WorkflowInstanceId {
        match self {
            Self::ApprovalRequested { workflow_id, .. }
            | Self::StepApproved { workflow_id, .. }
            | Self::Approved { workflow_id, .. }
            | Self::Rejected { workflow_id, .. }
            | Self::Delegated { workflow_id, .. }
            | Self::Commented { workflow_id, .. } => workflow_id,
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::ApprovalRequested { occurred_at, .. }
            | Self::StepApproved { occurred_at, .. }
            | Self::Approved { occurred_at, .. }
            | Self::Rejected { occurred_at, .. }
            | Self::Delegated { occurred_at, .. }
            | Self::Commented { occurred_at, .. } => *occurred_at,
        }
    }
}
