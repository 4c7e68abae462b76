//! # テスト用モック
//!
//! ユースケース・ハンドラのテストで使う、失敗注入や記録用の実装。
//! `test-utils` feature を有効にした場合のみ公開される。
//!
//! ```toml
//! [dev-dependencies]
//! shoninflow-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use shoninflow_domain::{
    event::WorkflowEvent,
    value_objects::ApproverId,
    workflow::WorkflowInstanceId,
};

use crate::{
    error::InfraError,
    event_sink::{EventSink, EventSinkError},
    permission::PermissionChecker,
    store::{TransactionManager, TxContext},
};

// ===== MockTransactionManager =====

/// コミットが必ず失敗する TransactionManager
#[derive(Debug, Clone, Default)]
pub struct FailingTransactionManager;

#[async_trait]
impl TransactionManager for FailingTransactionManager {
    async fn begin(&self) -> Result<TxContext, InfraError> {
        Ok(TxContext::failing("ストアが停止しています"))
    }
}

// ===== MockEventSink =====

/// 配信されたイベントを記録する EventSink
#[derive(Debug, Clone, Default)]
pub struct RecordingEventSink {
    events: Arc<Mutex<Vec<WorkflowEvent>>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 記録済みイベントのスナップショット
    pub fn events(&self) -> Vec<WorkflowEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn publish(&self, event: &WorkflowEvent) -> Result<(), EventSinkError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// 常に配信に失敗する EventSink
#[derive(Debug, Clone, Default)]
pub struct FailingEventSink;

#[async_trait]
impl EventSink for FailingEventSink {
    async fn publish(&self, _event: &WorkflowEvent) -> Result<(), EventSinkError> {
        Err(EventSinkError::Rejected("配信先が停止しています".to_string()))
    }
}

// ===== MockPermissionChecker =====

/// 拒否リストのアクターだけを拒否する PermissionChecker
#[derive(Debug, Clone, Default)]
pub struct DenyListPermissionChecker {
    denied: HashSet<ApproverId>,
}

impl DenyListPermissionChecker {
    pub fn new(denied: impl IntoIterator<Item = ApproverId>) -> Self {
        Self {
            denied: denied.into_iter().collect(),
        }
    }
}

#[async_trait]
impl PermissionChecker for DenyListPermissionChecker {
    async fn can_act(
        &self,
        actor: &ApproverId,
        _workflow_id: &WorkflowInstanceId,
    ) -> Result<bool, InfraError> {
        Ok(!self.denied.contains(actor))
    }
}

/// 判定先に問い合わせできない PermissionChecker
#[derive(Debug, Clone, Default)]
pub struct UnavailablePermissionChecker;

#[async_trait]
impl PermissionChecker for UnavailablePermissionChecker {
    async fn can_act(
        &self,
        _actor: &ApproverId,
        _workflow_id: &WorkflowInstanceId,
    ) -> Result<bool, InfraError> {
        Err(InfraError::unavailable("権限サービスに接続できません"))
    }
}
