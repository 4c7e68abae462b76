//! # アプリケーション組み立て
//!
//! 設定から依存コンポーネントを構築し、axum の Router を組み立てる。
//! `main.rs` と統合テストの両方から使う。

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use shoninflow_domain::{clock::SystemClock, event::WorkflowEvent};
use shoninflow_infra::{
    AllowAllPermissionChecker,
    ChannelEventSink,
    EventSink,
    InMemoryStore,
    InMemoryTransactionManager,
    InfraError,
    NoopEventSink,
    PermissionChecker,
    StaticPermissionChecker,
    repository::{
        InMemoryAuditTrailRepository,
        InMemoryWorkflowInstanceRepository,
        StaticWorkflowTemplateRepository,
    },
};
use shoninflow_shared::{event_log::event, log_business_event};
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use crate::{
    config::{CoreConfig, EventSinkBackend},
    handler::{
        WorkflowState,
        apply_action,
        create_workflow,
        create_workflow_from_template,
        get_eligible_approvers,
        get_history,
        get_workflow,
        health_check,
        list_pending_approvals,
        list_workflow_templates,
    },
    usecase::WorkflowUseCaseDeps,
};

/// Channel バックエンドのバッファ容量
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Core Service の Router を組み立てる
pub fn router(state: Arc<WorkflowState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/internal/workflows", post(create_workflow))
        .route(
            "/internal/workflows/from-template",
            post(create_workflow_from_template),
        )
        .route("/internal/workflows/{id}", get(get_workflow))
        .route("/internal/workflows/{id}/actions", post(apply_action))
        .route(
            "/internal/workflows/{id}/eligible-approvers",
            get(get_eligible_approvers),
        )
        .route("/internal/workflows/{id}/history", get(get_history))
        .route("/internal/approvals/pending", get(list_pending_approvals))
        .route("/internal/workflow-templates", get(list_workflow_templates))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// 設定からユースケースの依存コンポーネントを構築する
///
/// `EventSinkBackend::Channel` の場合はディスパッチャータスクを起動するため、
/// tokio ランタイム上で呼び出す必要がある。
///
/// # Errors
///
/// テンプレートファイルの読み込みまたは検証に失敗した場合。
pub fn build_deps(config: &CoreConfig) -> Result<WorkflowUseCaseDeps, InfraError> {
    let store = InMemoryStore::new();

    let template_repo = match &config.templates_path {
        Some(path) => StaticWorkflowTemplateRepository::from_json_file(path)?,
        None => StaticWorkflowTemplateRepository::new(Vec::new())?,
    };

    let permission_checker: Arc<dyn PermissionChecker> = match &config.permitted_actors {
        Some(actors) => Arc::new(StaticPermissionChecker::new(actors.iter().cloned())),
        None => Arc::new(AllowAllPermissionChecker),
    };

    let event_sink: Arc<dyn EventSink> = match config.event_sink {
        EventSinkBackend::Noop => Arc::new(NoopEventSink),
        EventSinkBackend::Channel => {
            let (sink, receiver) = ChannelEventSink::channel(EVENT_CHANNEL_CAPACITY);
            tokio::spawn(dispatch_events(receiver));
            Arc::new(sink)
        }
    };

    tracing::info!(
        templates = config.templates_path.as_deref().unwrap_or("(none)"),
        event_sink = ?config.event_sink,
        "依存コンポーネントを初期化しました"
    );

    Ok(WorkflowUseCaseDeps {
        instance_repo: Arc::new(InMemoryWorkflowInstanceRepository::new(store.clone())),
        audit_repo: Arc::new(InMemoryAuditTrailRepository::new(store.clone())),
        template_repo: Arc::new(template_repo),
        tx_manager: Arc::new(InMemoryTransactionManager::new(store)),
        permission_checker,
        event_sink,
        clock: Arc::new(SystemClock),
    })
}

/// Channel で受け取ったイベントをログに流すディスパッチャー
///
/// 配信側がすべて破棄されるとループを抜ける。
async fn dispatch_events(mut receiver: mpsc::Receiver<WorkflowEvent>) {
    while let Some(workflow_event) = receiver.recv().await {
        log_business_event!(
            event.category = event::category::EVENT_SINK,
            event.action = event::action::EVENT_PUBLISHED,
            event.entity_type = event::entity_type::WORKFLOW_INSTANCE,
            event.entity_id = %workflow_event.workflow_id(),
            event.result = event::result::SUCCESS,
            event_type = %workflow_event.event_type(),
            "ワークフローイベントを配信しました"
        );
    }
    tracing::debug!("イベントディスパッチャーを終了します");
}
