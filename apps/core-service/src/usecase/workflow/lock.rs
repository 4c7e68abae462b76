//! インスタンス単位の書き込みロック
//!
//! ワークフローインスタンス ID ごとに非同期 Mutex を払い出す。
//! 取得待ちは設定されたタイムアウトで打ち切り、`ConcurrentModification` として返す。

use std::{collections::HashMap, sync::Arc, time::Duration};

use shoninflow_domain::workflow::WorkflowInstanceId;
use shoninflow_shared::event_log::error;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::CoreError;

/// インスタンスロックのレジストリ
pub struct InstanceLockRegistry {
    locks:   Mutex<HashMap<WorkflowInstanceId, Arc<Mutex<()>>>>,
    timeout: Duration,
}

impl InstanceLockRegistry {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// インスタンスのロックを取得する
    ///
    /// ガードを drop するまで同じインスタンスへの他の書き込みは待たされる。
    ///
    /// # Errors
    ///
    /// タイムアウトまでに取得できなかった場合は `CoreError::ConcurrentModification`。
    pub async fn acquire(&self, id: &WorkflowInstanceId) -> Result<OwnedMutexGuard<()>, CoreError> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(id.clone()).or_default().clone()
        };

        tokio::time::timeout(self.timeout, lock.lock_owned())
            .await
            .map_err(|_| {
                tracing::warn!(
                    error.category = error::category::INFRASTRUCTURE,
                    error.kind = error::kind::LOCK_TIMEOUT,
                    workflow_id = %id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "インスタンスロックの取得がタイムアウトしました"
                );
                CoreError::ConcurrentModification(format!(
                    "インスタンス {id} のロックを {}ms 以内に取得できませんでした",
                    self.timeout.as_millis()
                ))
            })
    }

    /// 終了済みインスタンスのロックを解放する
    ///
    /// 取得待ちのタスクが残っている場合は何もしない。
    pub async fn forget(&self, id: &WorkflowInstanceId) {
        let mut locks = self.locks.lock().await;
        if locks.get(id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(id);
        }
    }

    /// 保持しているロックの数
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
