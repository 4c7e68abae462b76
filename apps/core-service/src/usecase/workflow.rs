//! # ワークフローユースケース
//!
//! ワークフローの作成・承認アクションの適用・参照に関するアプリケーションロジックを実装する。
//!
//! ## 書き込みの直列化
//!
//! 同一インスタンスへのアクションは [`InstanceLockRegistry`] のロックを保持したまま
//! 「再読み込み → ドメイン処理 → インスタンス更新と監査追記の一括コミット」を行う。
//! コミット時にはバージョン検査も行うため、ロック外からの書き込みも競合として検出される。

mod command;
mod lock;
mod query;

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
pub use lock::InstanceLockRegistry;
use serde_json::Value as JsonValue;
use shoninflow_domain::{
    clock::Clock,
    value_objects::{ApproverId, DocumentRef, Priority, ProjectRef},
    workflow::RoutingStrategy,
};
use shoninflow_infra::{
    EventSink,
    PermissionChecker,
    TransactionManager,
    repository::{AuditTrailRepository, WorkflowInstanceRepository, WorkflowTemplateRepository},
};

/// ワークフロー作成入力
#[derive(Debug, Clone)]
pub struct CreateWorkflowInput {
    pub document_ref:            DocumentRef,
    pub project_ref:             Option<ProjectRef>,
    /// ルーティング戦略（条件ルールを含む）
    pub strategy:                RoutingStrategy,
    pub required_approvers:      Vec<ApproverId>,
    pub priority:                Priority,
    /// 条件ルールの評価に使うドキュメント属性
    pub document_attributes:     JsonValue,
    pub estimated_completion_at: Option<DateTime<Utc>>,
}

/// テンプレートからのワークフロー作成入力
#[derive(Debug, Clone)]
pub struct CreateFromTemplateInput {
    pub document_type:       String,
    pub document_ref:        DocumentRef,
    pub priority:            Priority,
    pub project_ref:         Option<ProjectRef>,
    pub document_attributes: JsonValue,
    /// 指定時はテンプレートの既定承認者の代わりに使う
    pub approvers_override:  Option<Vec<ApproverId>>,
}

/// 承認待ち一覧の絞り込み条件
#[derive(Debug, Clone, Default)]
pub struct PendingApprovalFilter {
    /// 指定時は、この承認者が現在操作可能なインスタンスのみ
    pub approver_id: Option<ApproverId>,
    pub project_ref: Option<ProjectRef>,
    pub priority:    Option<Priority>,
}

/// ワークフローユースケースの依存コンポーネント
pub struct WorkflowUseCaseDeps {
    pub instance_repo:      Arc<dyn WorkflowInstanceRepository>,
    pub audit_repo:         Arc<dyn AuditTrailRepository>,
    pub template_repo:      Arc<dyn WorkflowTemplateRepository>,
    pub tx_manager:         Arc<dyn TransactionManager>,
    pub permission_checker: Arc<dyn PermissionChecker>,
    pub event_sink:         Arc<dyn EventSink>,
    pub clock:              Arc<dyn Clock>,
}

/// ワークフローユースケース実装
pub struct WorkflowUseCaseImpl {
    deps:  WorkflowUseCaseDeps,
    locks: InstanceLockRegistry,
}

impl WorkflowUseCaseImpl {
    /// 新しいワークフローユースケースを作成
    ///
    /// `lock_timeout` はインスタンスロック取得の最大待ち時間。
    pub fn new(deps: WorkflowUseCaseDeps, lock_timeout: Duration) -> Self {
        Self {
            deps,
            locks: InstanceLockRegistry::new(lock_timeout),
        }
    }

    /// インスタンスロックのレジストリ
    pub fn locks(&self) -> &InstanceLockRegistry {
        &self.locks
    }
}
