//! # ワークフローテンプレート API ハンドラ
//!
//! 起動時に読み込んだテンプレートの一覧を返す。

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shoninflow_domain::workflow::{ConditionalRule, WorkflowTemplate};
use shoninflow_shared::ApiResponse;

use super::workflow::WorkflowState;
use crate::error::CoreError;

/// ワークフローテンプレート DTO
#[derive(Debug, Serialize)]
pub struct WorkflowTemplateDto {
    pub id:                String,
    pub document_type:     String,
    pub name:              String,
    pub default_strategy:  String,
    pub conditional_rules: Vec<ConditionalRule>,
    pub default_approvers: Vec<String>,
    pub sla_days:          Option<u32>,
}

impl From<WorkflowTemplate> for WorkflowTemplateDto {
    fn from(template: WorkflowTemplate) -> Self {
        Self {
            id:                template.id.to_string(),
            document_type:     template.document_type,
            name:              template.name,
            default_strategy:  template.default_strategy.kind().to_string(),
            conditional_rules: template.default_strategy.rules().to_vec(),
            default_approvers: template
                .default_approvers
                .iter()
                .map(ToString::to_string)
                .collect(),
            sla_days:          template.sla_days,
        }
    }
}

/// テンプレート一覧を取得する
///
/// ## エンドポイント
/// GET /internal/workflow-templates
pub async fn list_workflow_templates(
    State(state): State<Arc<WorkflowState>>,
) -> Result<Response, CoreError> {
    let templates = state.usecase.list_templates().await?;

    let response = ApiResponse::new(
        templates
            .into_iter()
            .map(WorkflowTemplateDto::from)
            .collect::<Vec<_>>(),
    );
    Ok((StatusCode::OK, Json(response)).into_response())
}
