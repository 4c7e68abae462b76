//! # ワークフロー API ハンドラ
//!
//! Core Service のワークフロー関連エンドポイントを実装する。
//!
//! - `command`: 作成・アクション適用
//! - `query`: 取得・承認可能者・履歴・承認待ち一覧

mod command;
mod query;

use std::sync::Arc;

use chrono::{DateTime, Utc};
pub use command::{apply_action, create_workflow, create_workflow_from_template};
pub use query::{get_eligible_approvers, get_history, get_workflow, list_pending_approvals};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use shoninflow_domain::{
    audit_log::AuditEntry,
    value_objects::{ApproverId, Priority, ProjectRef},
    workflow::{ActionOutcome, ConditionalRule, PendingApprovalView, WorkflowInstance},
};

use crate::{error::CoreError, usecase::WorkflowUseCaseImpl};

/// ワークフローハンドラの State
pub struct WorkflowState {
    pub usecase: Arc<WorkflowUseCaseImpl>,
}

// ===== リクエスト =====

/// ワークフロー作成リクエスト
#[derive(Debug, Deserialize)]
pub struct CreateWorkflowRequest {
    /// 審査対象のドキュメント（版）への参照
    pub document_ref:            String,
    pub project_ref:             Option<String>,
    /// `sequential` / `parallel` / `conditional`
    pub strategy:                String,
    /// `conditional` のときのみ指定可能
    pub conditional_rules:       Option<Vec<ConditionalRule>>,
    pub required_approvers:      Vec<String>,
    /// 1（Low）〜 4（Urgent）
    pub priority:                u8,
    pub document_attributes:     Option<JsonValue>,
    pub estimated_completion_at: Option<DateTime<Utc>>,
}

/// テンプレートからのワークフロー作成リクエスト
#[derive(Debug, Deserialize)]
pub struct CreateFromTemplateRequest {
    pub document_type:       String,
    pub document_ref:        String,
    pub priority:            u8,
    pub project_ref:         Option<String>,
    pub document_attributes: Option<JsonValue>,
    /// 指定時はテンプレートの既定承認者を置き換える
    pub approvers_override:  Option<Vec<String>>,
}

/// 承認アクションリクエスト
#[derive(Debug, Deserialize)]
pub struct ApplyActionRequest {
    pub actor_id:    String,
    /// `approve` / `reject` / `comment` / `delegate`
    pub action_type: String,
    pub comment:     Option<String>,
    pub delegate_to: Option<String>,
}

/// 承認待ち一覧のクエリパラメータ
#[derive(Debug, Default, Deserialize)]
pub struct PendingApprovalsQuery {
    pub approver_id: Option<String>,
    pub project_ref: Option<String>,
    pub priority:    Option<u8>,
}

// ===== レスポンス =====

/// 承認者ごとの判断 DTO
#[derive(Debug, Serialize)]
pub struct ApproverDecisionDto {
    pub approver:   String,
    pub outcome:    String,
    pub decided_at: String,
}

/// ワークフローインスタンス DTO
#[derive(Debug, Serialize)]
pub struct WorkflowInstanceDto {
    pub id: String,
    pub document_ref: String,
    pub project_ref: Option<String>,
    pub strategy: String,
    pub conditional_rules: Vec<ConditionalRule>,
    pub required_approvers: Vec<String>,
    pub completed_approvers: Vec<ApproverDecisionDto>,
    pub eligible_approvers: Vec<String>,
    pub status: String,
    pub priority: u8,
    pub version: u32,
    pub document_attributes: JsonValue,
    pub estimated_completion_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

impl WorkflowInstanceDto {
    pub fn from_instance(instance: &WorkflowInstance) -> Self {
        Self {
            id: instance.id().to_string(),
            document_ref: instance.document_ref().to_string(),
            project_ref: instance.project_ref().map(ToString::to_string),
            strategy: instance.strategy().kind().to_string(),
            conditional_rules: instance.strategy().rules().to_vec(),
            required_approvers: to_strings(instance.required_approvers()),
            completed_approvers: instance
                .decisions()
                .iter()
                .map(|d| ApproverDecisionDto {
                    approver:   d.approver.to_string(),
                    outcome:    d.outcome.to_string(),
                    decided_at: d.decided_at.to_rfc3339(),
                })
                .collect(),
            eligible_approvers: to_strings(&instance.eligible_approvers()),
            status: instance.status().to_string(),
            priority: instance.priority().as_u8(),
            version: instance.version().as_u32(),
            document_attributes: instance.document_attributes().clone(),
            estimated_completion_at: instance.estimated_completion_at().map(|t| t.to_rfc3339()),
            created_at: instance.created_at().to_rfc3339(),
            updated_at: instance.updated_at().to_rfc3339(),
            completed_at: instance.completed_at().map(|t| t.to_rfc3339()),
        }
    }
}

/// 監査エントリ DTO
#[derive(Debug, Serialize)]
pub struct AuditEntryDto {
    pub workflow_id: String,
    pub sequence:    u32,
    pub actor_id:    String,
    pub action_type: String,
    pub comment:     Option<String>,
    pub delegate_to: Option<String>,
    pub timestamp:   String,
}

impl AuditEntryDto {
    pub fn from_entry(entry: &AuditEntry) -> Self {
        Self {
            workflow_id: entry.workflow_id().to_string(),
            sequence:    entry.sequence(),
            actor_id:    entry.actor_id().to_string(),
            action_type: entry.action_type().to_string(),
            comment:     entry.comment().map(str::to_string),
            delegate_to: entry.delegate_to().map(ToString::to_string),
            timestamp:   entry.timestamp().to_rfc3339(),
        }
    }
}

/// アクション適用結果 DTO
#[derive(Debug, Serialize)]
pub struct ActionResultDto {
    pub workflow:    WorkflowInstanceDto,
    pub audit_entry: AuditEntryDto,
    /// 配信したイベント種別
    pub events:      Vec<String>,
}

impl ActionResultDto {
    pub fn from_outcome(outcome: &ActionOutcome) -> Self {
        Self {
            workflow:    WorkflowInstanceDto::from_instance(&outcome.instance),
            audit_entry: AuditEntryDto::from_entry(&outcome.audit_entry),
            events:      outcome
                .events
                .iter()
                .map(|e| e.event_type().to_string())
                .collect(),
        }
    }
}

/// 承認待ち一覧の 1 件 DTO
#[derive(Debug, Serialize)]
pub struct PendingApprovalDto {
    pub workflow: WorkflowInstanceDto,
    pub age_in_days: i64,
    pub days_until_estimated_completion: Option<i64>,
    pub is_overdue: bool,
}

impl PendingApprovalDto {
    pub fn from_view(view: &PendingApprovalView) -> Self {
        Self {
            workflow: WorkflowInstanceDto::from_instance(&view.instance),
            age_in_days: view.age_in_days,
            days_until_estimated_completion: view.days_until_estimated_completion,
            is_overdue: view.is_overdue,
        }
    }
}

// ===== 変換ヘルパー =====

fn to_strings(approvers: &[ApproverId]) -> Vec<String> {
    approvers.iter().map(ToString::to_string).collect()
}

fn parse_approvers(values: Vec<String>) -> Result<Vec<ApproverId>, CoreError> {
    values
        .into_iter()
        .map(|v| ApproverId::new(v).map_err(CoreError::from))
        .collect()
}

fn parse_project_ref(value: Option<String>) -> Result<Option<ProjectRef>, CoreError> {
    Ok(value.map(ProjectRef::new).transpose()?)
}

fn parse_priority(value: u8) -> Result<Priority, CoreError> {
    Ok(Priority::try_from(value)?)
}
