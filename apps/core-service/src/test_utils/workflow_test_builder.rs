//! ワークフローテストビルダー
//!
//! テストコードの重複を削減するためのビルダーパターン実装。
//! インメモリストアを使った SUT と、アクション入力の組み立てを提供する。

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use shoninflow_domain::{
    clock::FixedClock,
    value_objects::{ApproverId, DocumentRef, Priority},
    workflow::{ActionType, ApprovalAction, RoutingStrategy, WorkflowInstanceId, WorkflowTemplate},
};
use shoninflow_infra::{
    AllowAllPermissionChecker,
    EventSink,
    InMemoryStore,
    InMemoryTransactionManager,
    PermissionChecker,
    TransactionManager,
    mock::RecordingEventSink,
    repository::{
        AuditTrailRepository,
        InMemoryAuditTrailRepository,
        InMemoryWorkflowInstanceRepository,
        StaticWorkflowTemplateRepository,
        WorkflowInstanceRepository,
    },
};

use crate::usecase::{CreateWorkflowInput, WorkflowUseCaseDeps, WorkflowUseCaseImpl};

/// ワークフローテストのセットアップデータ
///
/// WorkflowTestBuilder が生成する SUT と、検証に使う依存のセット。
pub struct WorkflowTestSetup {
    pub sut:           Arc<WorkflowUseCaseImpl>,
    pub store:         InMemoryStore,
    pub instance_repo: Arc<dyn WorkflowInstanceRepository>,
    pub audit_repo:    Arc<dyn AuditTrailRepository>,
    pub clock:         Arc<FixedClock>,
    /// `with_event_sink` で差し替えた場合は何も記録されない
    pub events:        RecordingEventSink,
}

/// ワークフローテストビルダー
///
/// # 使用例
///
/// ```ignore
/// use shoninflow_core_service::test_utils::{WorkflowTestBuilder, approve};
///
/// #[tokio::test]
/// async fn test_example() {
///     let builder = WorkflowTestBuilder::new();
///     let setup = builder.build();
///
///     let instance = setup
///         .sut
///         .create_workflow(builder.sequential_input(&["pm-1", "dir-1"]))
///         .await
///         .unwrap();
///     let outcome = setup.sut.apply_action(approve(instance.id(), "pm-1")).await.unwrap();
/// }
/// ```
pub struct WorkflowTestBuilder {
    now:                DateTime<Utc>,
    lock_timeout:       Duration,
    templates:          Vec<WorkflowTemplate>,
    permission_checker: Arc<dyn PermissionChecker>,
    tx_manager:         Option<Arc<dyn TransactionManager>>,
    event_sink:         Option<Arc<dyn EventSink>>,
}

impl WorkflowTestBuilder {
    /// デフォルト値で新しいビルダーを作成
    pub fn new() -> Self {
        Self {
            now:                DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            lock_timeout:       Duration::from_millis(500),
            templates:          Vec::new(),
            permission_checker: Arc::new(AllowAllPermissionChecker),
            tx_manager:         None,
            event_sink:         None,
        }
    }

    /// 現在時刻を指定
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// ロック取得のタイムアウトを指定
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// ワークフローテンプレートを指定
    pub fn with_templates(mut self, templates: Vec<WorkflowTemplate>) -> Self {
        self.templates = templates;
        self
    }

    /// 権限判定を差し替える
    pub fn with_permission_checker(mut self, checker: Arc<dyn PermissionChecker>) -> Self {
        self.permission_checker = checker;
        self
    }

    /// トランザクション管理を差し替える（失敗注入用）
    pub fn with_tx_manager(mut self, tx_manager: Arc<dyn TransactionManager>) -> Self {
        self.tx_manager = Some(tx_manager);
        self
    }

    /// イベント配信先を差し替える
    pub fn with_event_sink(mut self, event_sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(event_sink);
        self
    }

    /// ビルダーの now を取得
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// 逐次承認の作成入力（優先度 High）
    pub fn sequential_input(&self, approvers: &[&str]) -> CreateWorkflowInput {
        self.input_with(RoutingStrategy::Sequential, approvers)
    }

    /// 並列承認の作成入力（優先度 High）
    pub fn parallel_input(&self, approvers: &[&str]) -> CreateWorkflowInput {
        self.input_with(RoutingStrategy::Parallel, approvers)
    }

    /// 任意の戦略の作成入力（優先度 High）
    pub fn input_with(&self, strategy: RoutingStrategy, approvers: &[&str]) -> CreateWorkflowInput {
        CreateWorkflowInput {
            document_ref: DocumentRef::new("doc-1@v1").unwrap(),
            project_ref: None,
            strategy,
            required_approvers: approvers.iter().map(|a| approver(a)).collect(),
            priority: Priority::High,
            document_attributes: serde_json::json!({}),
            estimated_completion_at: None,
        }
    }

    /// SUT（System Under Test）を構築
    pub fn build(&self) -> WorkflowTestSetup {
        let store = InMemoryStore::new();
        let instance_repo: Arc<dyn WorkflowInstanceRepository> =
            Arc::new(InMemoryWorkflowInstanceRepository::new(store.clone()));
        let audit_repo: Arc<dyn AuditTrailRepository> =
            Arc::new(InMemoryAuditTrailRepository::new(store.clone()));
        let clock = Arc::new(FixedClock::new(self.now));
        let events = RecordingEventSink::new();

        let deps = WorkflowUseCaseDeps {
            instance_repo:      instance_repo.clone(),
            audit_repo:         audit_repo.clone(),
            template_repo:      Arc::new(
                StaticWorkflowTemplateRepository::new(self.templates.clone()).unwrap(),
            ),
            tx_manager:         self
                .tx_manager
                .clone()
                .unwrap_or_else(|| {
                    Arc::new(InMemoryTransactionManager::new(store.clone()))
                        as Arc<dyn TransactionManager>
                }),
            permission_checker: self.permission_checker.clone(),
            event_sink:         self
                .event_sink
                .clone()
                .unwrap_or_else(|| Arc::new(events.clone()) as Arc<dyn EventSink>),
            clock:              clock.clone(),
        };

        WorkflowTestSetup {
            sut: Arc::new(WorkflowUseCaseImpl::new(deps, self.lock_timeout)),
            store,
            instance_repo,
            audit_repo,
            clock,
            events,
        }
    }
}

impl Default for WorkflowTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 承認者 ID を作成
pub fn approver(id: &str) -> ApproverId {
    ApproverId::new(id).unwrap()
}

/// 承認アクション
pub fn approve(workflow_id: &WorkflowInstanceId, actor: &str) -> ApprovalAction {
    action(workflow_id, actor, ActionType::Approve, None, None)
}

/// 却下アクション
pub fn reject(workflow_id: &WorkflowInstanceId, actor: &str, reason: &str) -> ApprovalAction {
    action(
        workflow_id,
        actor,
        ActionType::Reject,
        Some(reason.to_string()),
        None,
    )
}

/// コメントアクション
pub fn comment(workflow_id: &WorkflowInstanceId, actor: &str, body: &str) -> ApprovalAction {
    action(
        workflow_id,
        actor,
        ActionType::Comment,
        Some(body.to_string()),
        None,
    )
}

/// 委任アクション
pub fn delegate(workflow_id: &WorkflowInstanceId, actor: &str, to: &str) -> ApprovalAction {
    action(workflow_id, actor, ActionType::Delegate, None, Some(approver(to)))
}

fn action(
    workflow_id: &WorkflowInstanceId,
    actor: &str,
    action_type: ActionType,
    comment: Option<String>,
    delegate_to: Option<ApproverId>,
) -> ApprovalAction {
    ApprovalAction {
        workflow_id: workflow_id.clone(),
        actor_id: approver(actor),
        action_type,
        comment,
        delegate_to,
    }
}
