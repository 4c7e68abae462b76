//! # 承認アクション処理
//!
//! 承認・却下・コメント・委任の各アクションを検証し、受理された場合は
//! 更新後のインスタンス・監査エントリ・配信イベントをまとめて返す。
//!
//! ## 検証順序
//!
//! 1. ワークフローが終了していれば `WorkflowClosed`
//! 2. 操作者が現在の承認可能者でなければ `NotEligible`（コメントも同様）
//! 3. 委任以外で委任先が指定されていれば `InvalidDelegate`
//! 4. アクション固有の検証（却下理由、コメント本文、委任先）
//!
//! いずれかで失敗した場合、インスタンスは変更されず監査エントリも生成されない。
//! 並行制御と永続化は呼び出し側の責務。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use super::instance::{DecisionOutcome, WorkflowInstance, WorkflowInstanceId, WorkflowStatus};
use crate::{
    ApprovalError,
    DomainError,
    audit_log::{AuditEntry, NewAuditEntry},
    event::WorkflowEvent,
    value_objects::ApproverId,
};

/// アクション種別
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
pub enum ActionType {
    Approve,
    Reject,
    Comment,
    Delegate,
}

impl std::str::FromStr for ActionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "comment" => Ok(Self::Comment),
            "delegate" => Ok(Self::Delegate),
            _ => Err(DomainError::Validation(format!("不正なアクション種別: {s}"))),
        }
    }
}

/// 承認アクション
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalAction {
    pub workflow_id: WorkflowInstanceId,
    pub actor_id:    ApproverId,
    pub action_type: ActionType,
    /// 却下では理由として必須、コメントでは本文として必須
    pub comment:     Option<String>,
    /// 委任でのみ指定する
    pub delegate_to: Option<ApproverId>,
}

/// 受理されたアクションの結果
///
/// `instance` と `audit_entry` は同じ単位でコミットし、
/// `events` はコミット後に配信する。
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub instance:    WorkflowInstance,
    pub audit_entry: AuditEntry,
    pub events:      Vec<WorkflowEvent>,
}

/// アクションを検証して適用する
///
/// # Errors
///
/// [モジュールドキュメント](self) の検証順序を参照。
pub fn process_action(
    instance: WorkflowInstance,
    action: &ApprovalAction,
    now: DateTime<Utc>,
) -> Result<ActionOutcome, ApprovalError> {
    if instance.is_terminal() {
        return Err(ApprovalError::WorkflowClosed {
            status: instance.status(),
        });
    }
    if &action.workflow_id != instance.id() {
        return Err(DomainError::Validation(format!(
            "アクションのワークフロー ID {} がインスタンス {} と一致しません",
            action.workflow_id,
            instance.id()
        ))
        .into());
    }

    let eligible_before = instance.eligible_approvers();
    if !eligible_before.contains(&action.actor_id) {
        return Err(ApprovalError::NotEligible {
            actor: action.actor_id.clone(),
        });
    }
    if action.action_type != ActionType::Delegate && action.delegate_to.is_some() {
        return Err(ApprovalError::InvalidDelegate(
            "委任先は委任アクションでのみ指定できます".to_string(),
        ));
    }

    let comment = action
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);
    let actor = &action.actor_id;
    let workflow_id = instance.id().clone();

    let (updated, mut events) = match action.action_type {
        ActionType::Approve => {
            let updated = instance.decided(actor, DecisionOutcome::Approved, now)?;
            let event = WorkflowEvent::StepApproved {
                workflow_id: workflow_id.clone(),
                approver:    actor.clone(),
                occurred_at: now,
            };
            (updated, vec![event])
        }
        ActionType::Reject => {
            let reason = comment.clone().ok_or(ApprovalError::MissingRejectionReason)?;
            let updated = instance.decided(actor, DecisionOutcome::Rejected, now)?;
            let event = WorkflowEvent::Rejected {
                workflow_id: workflow_id.clone(),
                approver: actor.clone(),
                reason,
                occurred_at: now,
            };
            (updated, vec![event])
        }
        ActionType::Comment => {
            if comment.is_none() {
                return Err(
                    DomainError::Validation("コメント本文は必須です".to_string()).into(),
                );
            }
            let event = WorkflowEvent::Commented {
                workflow_id: workflow_id.clone(),
                actor:       actor.clone(),
                occurred_at: now,
            };
            (instance.annotated(now), vec![event])
        }
        ActionType::Delegate => {
            let to = action.delegate_to.as_ref().ok_or_else(|| {
                ApprovalError::InvalidDelegate("委任先が指定されていません".to_string())
            })?;
            if instance.required_approvers().contains(to) {
                return Err(ApprovalError::InvalidDelegate(format!(
                    "{to} は既に必須承認者に含まれています"
                )));
            }
            let updated = instance.delegated(actor, to, now)?;
            let event = WorkflowEvent::Delegated {
                workflow_id: workflow_id.clone(),
                from:        actor.clone(),
                to:          to.clone(),
                occurred_at: now,
            };
            (updated, vec![event])
        }
    };

    if updated.status() == WorkflowStatus::Approved {
        events.push(WorkflowEvent::Approved {
            workflow_id: workflow_id.clone(),
            occurred_at: now,
        });
    } else if action.action_type != ActionType::Comment {
        let newly_eligible: Vec<ApproverId> = updated
            .eligible_approvers()
            .into_iter()
            .filter(|a| !eligible_before.contains(a))
            .collect();
        if !newly_eligible.is_empty() {
            events.push(WorkflowEvent::ApprovalRequested {
                workflow_id: workflow_id.clone(),
                approvers:   newly_eligible,
                occurred_at: now,
            });
        }
    }

    let audit_entry = AuditEntry::new(NewAuditEntry {
        workflow_id,
        sequence: updated.version().as_u32().saturating_sub(1),
        actor_id: actor.clone(),
        action_type: action.action_type,
        comment,
        delegate_to: action.delegate_to.clone(),
        timestamp: now,
    });

    Ok(ActionOutcome {
        instance: updated,
        audit_entry,
        events,
    })
}

/// 作成直後のインスタンスに対する承認依頼イベント
pub fn opening_events(instance: &WorkflowInstance) -> Vec<WorkflowEvent> {
    let approvers = instance.eligible_approvers();
    if approvers.is_empty() {
        return Vec::new();
    }
    vec![WorkflowEvent::ApprovalRequested {
        workflow_id: instance.id().clone(),
        approvers,
        occurred_at: instance.created_at(),
    }]
}
