//! # WorkflowInstanceRepository
//!
//! ワークフローインスタンスの永続化を担当するリポジトリ。

use async_trait::async_trait;
use shoninflow_domain::{
    value_objects::Version,
    workflow::{WorkflowInstance, WorkflowInstanceId},
};

use crate::{
    error::InfraError,
    store::{InMemoryStore, StagedWrite, TxContext},
};

/// ワークフローインスタンスリポジトリトレイト
#[async_trait]
pub trait WorkflowInstanceRepository: Send + Sync {
    /// 新規インスタンスを書き込む
    ///
    /// 同じ ID が既に存在する場合はコミット時に競合となる。
    async fn insert(&self, tx: &mut TxContext, instance: &WorkflowInstance)
    -> Result<(), InfraError>;

    /// バージョン検査付きでインスタンスを更新する
    ///
    /// `expected_version` は読み込み時点のバージョン。
    /// コミット時に保存済みバージョンと一致しなければ競合となる。
    async fn update_with_version_check(
        &self,
        tx: &mut TxContext,
        instance: &WorkflowInstance,
        expected_version: Version,
    ) -> Result<(), InfraError>;

    /// ID でインスタンスを取得
    async fn find_by_id(&self, id: &WorkflowInstanceId)
    -> Result<Option<WorkflowInstance>, InfraError>;

    /// 未完了（Pending / InReview）のインスタンスを取得
    async fn find_active(&self) -> Result<Vec<WorkflowInstance>, InfraError>;
}

/// インメモリ実装
#[derive(Debug, Clone)]
pub struct InMemoryWorkflowInstanceRepository {
    store: InMemoryStore,
}

impl InMemoryWorkflowInstanceRepository {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl WorkflowInstanceRepository for InMemoryWorkflowInstanceRepository {
    async fn insert(
        &self,
        tx: &mut TxContext,
        instance: &WorkflowInstance,
    ) -> Result<(), InfraError> {
        tx.stage(StagedWrite::InsertInstance(instance.to_record()));
        Ok(())
    }

    async fn update_with_version_check(
        &self,
        tx: &mut TxContext,
        instance: &WorkflowInstance,
        expected_version: Version,
    ) -> Result<(), InfraError> {
        tx.stage(StagedWrite::UpdateInstance {
            record: instance.to_record(),
            expected_version,
        });
        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(
        &self,
        id: &WorkflowInstanceId,
    ) -> Result<Option<WorkflowInstance>, InfraError> {
        let record = self.store.lock()?.instances.get(id).cloned();
        record
            .map(WorkflowInstance::from_record)
            .transpose()
            .map_err(InfraError::from)
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_active(&self) -> Result<Vec<WorkflowInstance>, InfraError> {
        let records: Vec<_> = self
            .store
            .lock()?
            .instances
            .values()
            .filter(|r| !r.status.is_terminal())
            .cloned()
            .collect();
        records
            .into_iter()
            .map(|r| WorkflowInstance::from_record(r).map_err(InfraError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use shoninflow_domain::{
        value_objects::{ApproverId, DocumentRef, Priority},
        workflow::{
            ActionType,
            ApprovalAction,
            NewWorkflowInstance,
            RoutingStrategy,
            WorkflowStatus,
            process_action,
        },
    };

    use super::*;
    use crate::store::{InMemoryTransactionManager, TransactionManager};

    fn new_instance(document: &str, strategy: RoutingStrategy) -> WorkflowInstance {
        WorkflowInstance::new(NewWorkflowInstance {
            id: WorkflowInstanceId::new(),
            document_ref: DocumentRef::new(document).unwrap(),
            project_ref: None,
            strategy,
            required_approvers: vec![ApproverId::new("pm-1").unwrap()],
            document_attributes: json!({}),
            priority: Priority::High,
            estimated_completion_at: None,
            now: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
        })
        .unwrap()
    }

    #[fixture]
    fn instance() -> WorkflowInstance {
        new_instance("doc-1", RoutingStrategy::Sequential)
    }

    async fn insert(store: &InMemoryStore, instance: &WorkflowInstance) {
        let repo = InMemoryWorkflowInstanceRepository::new(store.clone());
        let mut tx = InMemoryTransactionManager::new(store.clone())
            .begin()
            .await
            .unwrap();
        repo.insert(&mut tx, instance).await.unwrap();
        tx.commit().await.unwrap();
    }

    #[rstest]
    #[tokio::test]
    async fn test_insertしたインスタンスをfind_by_idで取得できる(instance: WorkflowInstance) {
        let store = InMemoryStore::new();
        insert(&store, &instance).await;
        let sut = InMemoryWorkflowInstanceRepository::new(store);

        let found = sut.find_by_id(instance.id()).await.unwrap();

        assert_eq!(found, Some(instance));
    }

    #[tokio::test]
    async fn test_存在しないidはnoneを返す() {
        let sut = InMemoryWorkflowInstanceRepository::new(InMemoryStore::new());

        let found = sut.find_by_id(&WorkflowInstanceId::new()).await.unwrap();

        assert_eq!(found, None);
    }

    #[rstest]
    #[tokio::test]
    async fn test_古いバージョンでの更新は競合になる(instance: WorkflowInstance) {
        let store = InMemoryStore::new();
        insert(&store, &instance).await;
        let sut = InMemoryWorkflowInstanceRepository::new(store.clone());
        let manager = InMemoryTransactionManager::new(store);
        let stale = Version::new(5).unwrap();

        let mut tx = manager.begin().await.unwrap();
        sut.update_with_version_check(&mut tx, &instance, stale)
            .await
            .unwrap();
        let result = tx.commit().await;

        assert!(result.unwrap_err().is_conflict());
    }

    #[rstest]
    #[tokio::test]
    async fn test_find_activeは終了済みを含まない(instance: WorkflowInstance) {
        let store = InMemoryStore::new();
        let sut = InMemoryWorkflowInstanceRepository::new(store.clone());
        let manager = InMemoryTransactionManager::new(store.clone());
        let other = new_instance("doc-2", RoutingStrategy::Parallel);
        insert(&store, &instance).await;
        insert(&store, &other).await;

        let action = ApprovalAction {
            workflow_id: other.id().clone(),
            actor_id:    ApproverId::new("pm-1").unwrap(),
            action_type: ActionType::Approve,
            comment:     None,
            delegate_to: None,
        };
        let approved = process_action(other.clone(), &action, Utc::now())
            .unwrap()
            .instance;
        assert_eq!(approved.status(), WorkflowStatus::Approved);
        let mut tx = manager.begin().await.unwrap();
        sut.update_with_version_check(&mut tx, &approved, other.version())
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let active = sut.find_active().await.unwrap();

        assert_eq!(active, vec![instance]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_破損したレコードは復元時にエラーになる(instance: WorkflowInstance) {
        let store = InMemoryStore::new();
        let mut record = instance.to_record();
        record.status = WorkflowStatus::Approved;
        store
            .lock()
            .unwrap()
            .instances
            .insert(instance.id().clone(), record);
        let sut = InMemoryWorkflowInstanceRepository::new(store);

        let result = sut.find_by_id(instance.id()).await;

        assert!(result.is_err());
    }
}
