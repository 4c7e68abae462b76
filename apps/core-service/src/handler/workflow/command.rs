//! ワークフローハンドラの状態変更操作

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shoninflow_domain::{
    value_objects::{ApproverId, DocumentRef},
    workflow::{ActionType, ApprovalAction, RoutingStrategy, StrategyKind, WorkflowInstanceId},
};
use shoninflow_shared::ApiResponse;
use uuid::Uuid;

use super::{
    ActionResultDto,
    ApplyActionRequest,
    CreateFromTemplateRequest,
    CreateWorkflowRequest,
    WorkflowInstanceDto,
    WorkflowState,
    parse_approvers,
    parse_priority,
    parse_project_ref,
};
use crate::{
    error::CoreError,
    usecase::{CreateFromTemplateInput, CreateWorkflowInput},
};

/// ワークフローを作成する
///
/// ## エンドポイント
/// POST /internal/workflows
pub async fn create_workflow(
    State(state): State<Arc<WorkflowState>>,
    Json(req): Json<CreateWorkflowRequest>,
) -> Result<Response, CoreError> {
    let strategy = routing_strategy(&req.strategy, req.conditional_rules)?;
    let input = CreateWorkflowInput {
        document_ref: DocumentRef::new(req.document_ref)?,
        project_ref: parse_project_ref(req.project_ref)?,
        strategy,
        required_approvers: parse_approvers(req.required_approvers)?,
        priority: parse_priority(req.priority)?,
        document_attributes: req.document_attributes.unwrap_or_default(),
        estimated_completion_at: req.estimated_completion_at,
    };

    let instance = state.usecase.create_workflow(input).await?;

    let response = ApiResponse::new(WorkflowInstanceDto::from_instance(&instance));
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// テンプレートからワークフローを作成する
///
/// ## エンドポイント
/// POST /internal/workflows/from-template
pub async fn create_workflow_from_template(
    State(state): State<Arc<WorkflowState>>,
    Json(req): Json<CreateFromTemplateRequest>,
) -> Result<Response, CoreError> {
    let input = CreateFromTemplateInput {
        document_type: req.document_type,
        document_ref: DocumentRef::new(req.document_ref)?,
        priority: parse_priority(req.priority)?,
        project_ref: parse_project_ref(req.project_ref)?,
        document_attributes: req.document_attributes.unwrap_or_default(),
        approvers_override: req.approvers_override.map(parse_approvers).transpose()?,
    };

    let instance = state.usecase.create_workflow_from_template(input).await?;

    let response = ApiResponse::new(WorkflowInstanceDto::from_instance(&instance));
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// 承認アクションを適用する
///
/// ## エンドポイント
/// POST /internal/workflows/{id}/actions
///
/// ## レスポンス
/// - 200: 更新後のインスタンスと追記された監査エントリ
/// - 4xx: エラー種別ごとの安定コード（`not_eligible` など）
pub async fn apply_action(
    State(state): State<Arc<WorkflowState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ApplyActionRequest>,
) -> Result<Response, CoreError> {
    let action = ApprovalAction {
        workflow_id: WorkflowInstanceId::from_uuid(id),
        actor_id:    ApproverId::new(req.actor_id)?,
        action_type: req.action_type.parse::<ActionType>()?,
        comment:     req.comment,
        delegate_to: req.delegate_to.map(ApproverId::new).transpose()?,
    };

    let outcome = state.usecase.apply_action(action).await?;

    let response = ApiResponse::new(ActionResultDto::from_outcome(&outcome));
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 戦略名と条件ルールからルーティング戦略を組み立てる
fn routing_strategy(
    strategy: &str,
    rules: Option<Vec<shoninflow_domain::workflow::ConditionalRule>>,
) -> Result<RoutingStrategy, CoreError> {
    match (strategy.parse::<StrategyKind>()?, rules) {
        (StrategyKind::Sequential, None) => Ok(RoutingStrategy::Sequential),
        (StrategyKind::Parallel, None) => Ok(RoutingStrategy::Parallel),
        (StrategyKind::Conditional, rules) => Ok(RoutingStrategy::Conditional {
            rules: rules.unwrap_or_default(),
        }),
        (kind, Some(_)) => Err(CoreError::BadRequest(format!(
            "条件ルールは conditional 戦略でのみ指定できます（指定された戦略: {kind}）"
        ))),
    }
}
