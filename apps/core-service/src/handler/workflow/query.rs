//! ワークフローハンドラの読み取り操作

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shoninflow_domain::{value_objects::ApproverId, workflow::WorkflowInstanceId};
use shoninflow_shared::ApiResponse;
use uuid::Uuid;

use super::{
    AuditEntryDto,
    PendingApprovalDto,
    PendingApprovalsQuery,
    WorkflowInstanceDto,
    WorkflowState,
    parse_priority,
    parse_project_ref,
    to_strings,
};
use crate::{error::CoreError, usecase::PendingApprovalFilter};

/// ワークフローを取得する
///
/// ## エンドポイント
/// GET /internal/workflows/{id}
pub async fn get_workflow(
    State(state): State<Arc<WorkflowState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, CoreError> {
    let instance = state
        .usecase
        .get_workflow(&WorkflowInstanceId::from_uuid(id))
        .await?;

    let response = ApiResponse::new(WorkflowInstanceDto::from_instance(&instance));
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 現在アクション可能な承認者を取得する
///
/// ## エンドポイント
/// GET /internal/workflows/{id}/eligible-approvers
///
/// 終端状態のワークフローでは空配列を返す。
pub async fn get_eligible_approvers(
    State(state): State<Arc<WorkflowState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, CoreError> {
    let approvers = state
        .usecase
        .get_eligible_approvers(&WorkflowInstanceId::from_uuid(id))
        .await?;

    let response = ApiResponse::new(to_strings(&approvers));
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 監査履歴を古い順に取得する
///
/// ## エンドポイント
/// GET /internal/workflows/{id}/history
pub async fn get_history(
    State(state): State<Arc<WorkflowState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, CoreError> {
    let entries = state
        .usecase
        .get_history(&WorkflowInstanceId::from_uuid(id))
        .await?;

    let response = ApiResponse::new(
        entries
            .iter()
            .map(AuditEntryDto::from_entry)
            .collect::<Vec<_>>(),
    );
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 承認待ち一覧を優先順に取得する
///
/// ## エンドポイント
/// GET /internal/approvals/pending?approver_id={approver_id}&project_ref={project_ref}&priority={priority}
///
/// ## 並び順
/// 1. Urgent
/// 2. 完了予定日時を超過したもの
/// 3. 優先度の高い順
/// 4. 作成日時の古い順
pub async fn list_pending_approvals(
    State(state): State<Arc<WorkflowState>>,
    Query(query): Query<PendingApprovalsQuery>,
) -> Result<Response, CoreError> {
    let filter = PendingApprovalFilter {
        approver_id: query.approver_id.map(ApproverId::new).transpose()?,
        project_ref: parse_project_ref(query.project_ref)?,
        priority:    query.priority.map(parse_priority).transpose()?,
    };

    let views = state.usecase.list_pending(filter).await?;

    let response = ApiResponse::new(
        views
            .iter()
            .map(PendingApprovalDto::from_view)
            .collect::<Vec<_>>(),
    );
    Ok((StatusCode::OK, Json(response)).into_response())
}
