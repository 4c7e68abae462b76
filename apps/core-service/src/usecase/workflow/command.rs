//! ワークフローの状態変更操作
//!
//! 作成とアクション適用。どちらもインスタンスと監査エントリを
//! 単一トランザクションでコミットし、コミット後にイベントを配信する。
//! 失敗した書き込みをエンジン側で再試行することはない。

use shoninflow_domain::{
    event::WorkflowEvent,
    value_objects::ApproverId,
    workflow::{
        ActionOutcome,
        ActionType,
        ApprovalAction,
        NewWorkflowInstance,
        WorkflowInstance,
        WorkflowInstanceId,
        opening_events,
        process_action,
    },
};
use shoninflow_infra::TxContext;
use shoninflow_shared::{
    event_log::{error, event},
    log_business_event,
};

use super::{CreateFromTemplateInput, CreateWorkflowInput, WorkflowUseCaseImpl};
use crate::{
    error::CoreError,
    usecase::helpers::{FindResultExt, write_error},
};

impl WorkflowUseCaseImpl {
    /// ワークフローインスタンスを作成する
    ///
    /// ## 処理フロー
    ///
    /// 1. 入力を検証してインスタンスを生成（Pending）
    /// 2. リポジトリに保存
    /// 3. 最初の承認可能者への承認依頼イベントを配信
    ///
    /// ## エラー
    ///
    /// - 承認者・条件ルール・属性が不正な場合は `BadRequest`
    /// - 保存に失敗した場合は `PersistenceFailure`
    #[tracing::instrument(skip_all, fields(document_ref = %input.document_ref))]
    pub async fn create_workflow(
        &self,
        input: CreateWorkflowInput,
    ) -> Result<WorkflowInstance, CoreError> {
        let now = self.deps.clock.now();
        self.insert_instance(NewWorkflowInstance {
            id: WorkflowInstanceId::new(),
            document_ref: input.document_ref,
            project_ref: input.project_ref,
            strategy: input.strategy,
            required_approvers: input.required_approvers,
            document_attributes: input.document_attributes,
            priority: input.priority,
            estimated_completion_at: input.estimated_completion_at,
            now,
        })
        .await
    }

    /// テンプレートからワークフローインスタンスを作成する
    ///
    /// テンプレートの戦略・承認者を既定値とし、SLA 日数があれば
    /// 作成時刻から完了予定日時を算出する。
    #[tracing::instrument(skip_all, fields(document_type = %input.document_type))]
    pub async fn create_workflow_from_template(
        &self,
        input: CreateFromTemplateInput,
    ) -> Result<WorkflowInstance, CoreError> {
        let template = self
            .deps
            .template_repo
            .find_by_document_type(&input.document_type)
            .await
            .or_not_found("ワークフローテンプレート")?;

        let now = self.deps.clock.now();
        let estimated_completion_at = template.estimated_completion_from(now);
        self.insert_instance(NewWorkflowInstance {
            id: WorkflowInstanceId::new(),
            document_ref: input.document_ref,
            project_ref: input.project_ref,
            strategy: template.default_strategy,
            required_approvers: input
                .approvers_override
                .unwrap_or(template.default_approvers),
            document_attributes: input.document_attributes,
            priority: input.priority,
            estimated_completion_at,
            now,
        })
        .await
    }

    /// 承認アクションを適用する
    ///
    /// ## 処理フロー
    ///
    /// 1. 権限判定（エンジン外のアクセス制御）
    /// 2. インスタンスロックを取得
    /// 3. ロック内でインスタンスを再読み込み
    /// 4. ドメインでアクションを検証・適用
    /// 5. インスタンス更新（バージョン検査付き）と監査追記を一括コミット
    /// 6. ロックを解放し、終了済みならロックを破棄
    /// 7. イベントを配信（失敗はログのみ）
    ///
    /// ## エラー
    ///
    /// - 権限がない場合は `Forbidden`
    /// - ロックを取得できない、またはコミット時に競合した場合は `ConcurrentModification`
    /// - ドメインの検証に失敗した場合は `Approval`
    /// - 保存に失敗した場合は `PersistenceFailure`
    #[tracing::instrument(
        skip_all,
        fields(
            workflow_id = %action.workflow_id,
            actor_id = %action.actor_id,
            action_type = %action.action_type
        )
    )]
    pub async fn apply_action(&self, action: ApprovalAction) -> Result<ActionOutcome, CoreError> {
        // 1. 権限判定
        self.ensure_can_act(&action.actor_id, &action.workflow_id)
            .await?;

        // 2. インスタンスロックを取得
        let guard = self.locks.acquire(&action.workflow_id).await?;

        // 3. 最新のインスタンスを取得
        let found = self
            .deps
            .instance_repo
            .find_by_id(&action.workflow_id)
            .await
            .or_not_found("ワークフロー");
        let instance = match found {
            Ok(instance) => instance,
            Err(e) => {
                // 存在しない ID のロックは残さない
                drop(guard);
                self.locks.forget(&action.workflow_id).await;
                return Err(e);
            }
        };
        let expected_version = instance.version();

        // 4. ドメインで検証・適用
        let now = self.deps.clock.now();
        let outcome = process_action(instance, &action, now).map_err(|e| {
            log_business_event!(
                event.category = event::category::WORKFLOW,
                event.action = event::action::ACTION_REFUSED,
                event.entity_type = event::entity_type::WORKFLOW_INSTANCE,
                event.entity_id = %action.workflow_id,
                event.actor_id = %action.actor_id,
                event.result = event::result::FAILURE,
                reason = e.code(),
                "承認アクションを拒否"
            );
            CoreError::from(e)
        })?;

        // 5. インスタンスと監査エントリを一括コミット
        let mut tx = self.begin_tx().await?;
        self.deps
            .instance_repo
            .update_with_version_check(&mut tx, &outcome.instance, expected_version)
            .await
            .map_err(write_error)?;
        self.deps
            .audit_repo
            .append(&mut tx, &outcome.audit_entry)
            .await
            .map_err(write_error)?;
        tx.commit().await.map_err(write_error)?;

        // 6. ロック解放
        drop(guard);
        if outcome.instance.is_terminal() {
            self.locks.forget(outcome.instance.id()).await;
        }

        log_business_event!(
            event.category = event::category::WORKFLOW,
            event.action = action_event_name(action.action_type),
            event.entity_type = event::entity_type::WORKFLOW_INSTANCE,
            event.entity_id = %action.workflow_id,
            event.actor_id = %action.actor_id,
            event.result = event::result::SUCCESS,
            status = %outcome.instance.status(),
            sequence = outcome.audit_entry.sequence(),
            "承認アクションを適用"
        );

        // 7. イベント配信
        self.publish_events(&outcome.events).await;

        Ok(outcome)
    }

    /// 新規インスタンスを検証・保存し、承認依頼イベントを配信する
    async fn insert_instance(
        &self,
        params: NewWorkflowInstance,
    ) -> Result<WorkflowInstance, CoreError> {
        let instance =
            WorkflowInstance::new(params).map_err(|e| CoreError::BadRequest(e.to_string()))?;

        let mut tx = self.begin_tx().await?;
        self.deps
            .instance_repo
            .insert(&mut tx, &instance)
            .await
            .map_err(write_error)?;
        tx.commit().await.map_err(write_error)?;

        log_business_event!(
            event.category = event::category::WORKFLOW,
            event.action = event::action::WORKFLOW_CREATED,
            event.entity_type = event::entity_type::WORKFLOW_INSTANCE,
            event.entity_id = %instance.id(),
            event.result = event::result::SUCCESS,
            strategy = %instance.strategy().kind(),
            priority = instance.priority().as_u8(),
            "ワークフローを作成"
        );

        self.publish_events(&opening_events(&instance)).await;

        Ok(instance)
    }

    /// アクターに操作権限があることを確認する
    async fn ensure_can_act(
        &self,
        actor: &ApproverId,
        workflow_id: &WorkflowInstanceId,
    ) -> Result<(), CoreError> {
        let allowed = self
            .deps
            .permission_checker
            .can_act(actor, workflow_id)
            .await
            .map_err(|e| {
                tracing::error!(
                    error.category = error::category::EXTERNAL_CAPABILITY,
                    error.kind = error::kind::PERMISSION_CHECK,
                    "権限判定に失敗: {}",
                    e
                );
                CoreError::PersistenceFailure(e)
            })?;
        if !allowed {
            return Err(CoreError::Forbidden(
                "このワークフローを操作する権限がありません".to_string(),
            ));
        }
        Ok(())
    }

    /// トランザクションを開始する
    async fn begin_tx(&self) -> Result<TxContext, CoreError> {
        self.deps
            .tx_manager
            .begin()
            .await
            .map_err(CoreError::PersistenceFailure)
    }

    /// イベントを配信する
    ///
    /// 配信は best-effort。失敗してもアクションの結果は変わらない。
    async fn publish_events(&self, events: &[WorkflowEvent]) {
        for e in events {
            if let Err(err) = self.deps.event_sink.publish(e).await {
                log_business_event!(
                    event.category = event::category::EVENT_SINK,
                    event.action = event::action::EVENT_PUBLISH_FAILED,
                    event.entity_type = event::entity_type::WORKFLOW_INSTANCE,
                    event.entity_id = %e.workflow_id(),
                    event.result = event::result::FAILURE,
                    event_type = %e.event_type(),
                    error.category = error::category::EXTERNAL_CAPABILITY,
                    "イベント配信に失敗: {}",
                    err
                );
            }
        }
    }
}

fn action_event_name(action_type: ActionType) -> &'static str {
    match action_type {
        ActionType::Approve => event::action::APPROVER_APPROVED,
        ActionType::Reject => event::action::APPROVER_REJECTED,
        ActionType::Delegate => event::action::APPROVER_DELEGATED,
        ActionType::Comment => event::action::COMMENT_POSTED,
    }
}
