//! # 権限判定
//!
//! アクターがワークフローに対して操作可能かを判定する外部ケイパビリティ。
//! 承認順序（誰の番か）はドメイン層のルーティングが決めるため、
//! ここで判定するのはエンジン外のアクセス制御のみ。

use std::collections::HashSet;

use async_trait::async_trait;
use shoninflow_domain::{value_objects::ApproverId, workflow::WorkflowInstanceId};

use crate::InfraError;

/// 権限判定を担当するトレイト
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    /// アクターがワークフローを操作できるか
    ///
    /// # Errors
    ///
    /// 判定先に問い合わせられなかった場合。
    async fn can_act(
        &self,
        actor: &ApproverId,
        workflow_id: &WorkflowInstanceId,
    ) -> Result<bool, InfraError>;
}

/// すべてのアクターを許可する実装
#[derive(Debug, Clone, Default)]
pub struct AllowAllPermissionChecker;

#[async_trait]
impl PermissionChecker for AllowAllPermissionChecker {
    async fn can_act(
        &self,
        _actor: &ApproverId,
        _workflow_id: &WorkflowInstanceId,
    ) -> Result<bool, InfraError> {
        Ok(true)
    }
}

/// 許可リストに含まれるアクターのみ許可する実装
#[derive(Debug, Clone)]
pub struct StaticPermissionChecker {
    permitted: HashSet<ApproverId>,
}

impl StaticPermissionChecker {
    pub fn new(permitted: impl IntoIterator<Item = ApproverId>) -> Self {
        Self {
            permitted: permitted.into_iter().collect(),
        }
    }
}

#[async_trait]
impl PermissionChecker for StaticPermissionChecker {
    async fn can_act(
        &self,
        actor: &ApproverId,
        _workflow_id: &WorkflowInstanceId,
    ) -> Result<bool, InfraError> {
        Ok(self.permitted.contains(actor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> ApproverId {
        ApproverId::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_allow_allは常に許可する() {
        let sut = AllowAllPermissionChecker;

        let result = sut.can_act(&id("anyone"), &WorkflowInstanceId::new()).await;

        assert!(result.unwrap());
    }

    #[tokio::test]
    async fn test_staticは許可リストのアクターだけ許可する() {
        let sut = StaticPermissionChecker::new([id("pm-1"), id("dir-1")]);
        let workflow_id = WorkflowInstanceId::new();

        assert!(sut.can_act(&id("pm-1"), &workflow_id).await.unwrap());
        assert!(!sut.can_act(&id("intruder"), &workflow_id).await.unwrap());
    }
}
