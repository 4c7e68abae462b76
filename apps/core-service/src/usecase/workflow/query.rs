//! ワークフローの参照操作
//!
//! いずれもロックを取らずに保存済みの状態を読む。
//! 承認待ちビューの経過日数などは呼び出しごとに現在時刻から再計算する。

use shoninflow_domain::{
    audit_log::AuditEntry,
    value_objects::ApproverId,
    workflow::{
        PendingApprovalView,
        WorkflowInstance,
        WorkflowInstanceId,
        WorkflowTemplate,
        prioritize,
    },
};

use super::{PendingApprovalFilter, WorkflowUseCaseImpl};
use crate::{
    error::CoreError,
    usecase::helpers::FindResultExt,
};

impl WorkflowUseCaseImpl {
    /// ワークフローインスタンスを取得する
    #[tracing::instrument(skip_all, fields(%id))]
    pub async fn get_workflow(&self, id: &WorkflowInstanceId) -> Result<WorkflowInstance, CoreError> {
        self.deps
            .instance_repo
            .find_by_id(id)
            .await
            .or_not_found("ワークフロー")
    }

    /// 現在操作可能な承認者を取得する
    ///
    /// 終了済みのインスタンスでは空になる。
    pub async fn get_eligible_approvers(
        &self,
        id: &WorkflowInstanceId,
    ) -> Result<Vec<ApproverId>, CoreError> {
        Ok(self.get_workflow(id).await?.eligible_approvers())
    }

    /// 監査証跡を追記順で取得する
    #[tracing::instrument(skip_all, fields(%id))]
    pub async fn get_history(&self, id: &WorkflowInstanceId) -> Result<Vec<AuditEntry>, CoreError> {
        // 存在しないインスタンスは空の履歴ではなく NotFound
        self.get_workflow(id).await?;

        self.deps
            .audit_repo
            .find_by_workflow(id)
            .await
            .map_err(CoreError::PersistenceFailure)
    }

    /// 承認待ち一覧を処理順で取得する
    ///
    /// 対象は未完了のインスタンスのみ。並び順は緊急 → SLA 超過 → 優先度 → 古い順。
    #[tracing::instrument(skip_all)]
    pub async fn list_pending(
        &self,
        filter: PendingApprovalFilter,
    ) -> Result<Vec<PendingApprovalView>, CoreError> {
        let active = self
            .deps
            .instance_repo
            .find_active()
            .await
            .map_err(CoreError::PersistenceFailure)?;

        let matching = active.into_iter().filter(|instance| {
            filter
                .project_ref
                .as_ref()
                .is_none_or(|p| instance.project_ref() == Some(p))
                && filter.priority.is_none_or(|p| instance.priority() == p)
                && filter
                    .approver_id
                    .as_ref()
                    .is_none_or(|a| instance.is_eligible(a))
        });

        Ok(prioritize(matching, self.deps.clock.now()))
    }

    /// ワークフローテンプレート一覧を取得する
    pub async fn list_templates(&self) -> Result<Vec<WorkflowTemplate>, CoreError> {
        self.deps
            .template_repo
            .find_all()
            .await
            .map_err(CoreError::PersistenceFailure)
    }
}
