//! # AuditTrailRepository
//!
//! 監査証跡（追記専用）の永続化を担当するリポジトリ。
//! 更新・削除のメソッドは持たない。

use async_trait::async_trait;
use shoninflow_domain::{audit_log::AuditEntry, workflow::WorkflowInstanceId};

use crate::{
    error::InfraError,
    store::{InMemoryStore, StagedWrite, TxContext},
};

#[async_trait]
pub trait AuditTrailRepository: Send + Sync {
    /// 監査エントリを追記する
    ///
    /// 連番が直前のエントリ + 1 でなければコミット時に競合となる。
    async fn append(&self, tx: &mut TxContext, entry: &AuditEntry) -> Result<(), InfraError>;

    /// インスタンスの監査証跡を連番順で取得
    async fn find_by_workflow(
        &self,
        workflow_id: &WorkflowInstanceId,
    ) -> Result<Vec<AuditEntry>, InfraError>;
}

#[derive(Debug, Clone)]
pub struct InMemoryAuditTrailRepository {
    store: InMemoryStore,
}

impl InMemoryAuditTrailRepository {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuditTrailRepository for InMemoryAuditTrailRepository {
    async fn append(&self, tx: &mut TxContext, entry: &AuditEntry) -> Result<(), InfraError> {
        tx.stage(StagedWrite::AppendAudit(entry.clone()));
        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%workflow_id))]
    async fn find_by_workflow(
        &self,
        workflow_id: &WorkflowInstanceId,
    ) -> Result<Vec<AuditEntry>, InfraError> {
        Ok(self
            .store
            .lock()?
            .audit_trails
            .get(workflow_id)
            .cloned()
            .unwrap_or_default())
    }
}
