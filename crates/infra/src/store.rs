//! # インメモリストアとトランザクション
//!
//! ワークフローインスタンスと監査証跡を同一プロセス内で保持する。
//!
//! ## 原子的コミット
//!
//! 書き込みはリポジトリ経由で [`TxContext`] に積まれ、[`TxContext::commit`] で
//! ストアのロックを 1 回だけ取って一括反映される。反映前にすべての書き込みを
//! 検証し、1 件でも失敗すれば何も反映しない。
//!
//! | 書き込み | 検証 |
//! |---------|------|
//! | インスタンス新規作成 | 同じ ID が存在しない |
//! | インスタンス更新 | 保存済みバージョンが期待値と一致する |
//! | 監査エントリ追記 | 連番が直前のエントリ + 1 |
//!
//! 書き込みメソッドは `&mut TxContext` を必須引数とするため、
//! トランザクション外の書き込みはコンパイルエラーになる。

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use shoninflow_domain::{
    audit_log::AuditEntry,
    value_objects::Version,
    workflow::{WorkflowInstanceId, WorkflowInstanceRecord},
};

use crate::error::InfraError;

#[derive(Debug, Default)]
pub(crate) struct StoreState {
    pub(crate) instances:    HashMap<WorkflowInstanceId, WorkflowInstanceRecord>,
    pub(crate) audit_trails: HashMap<WorkflowInstanceId, Vec<AuditEntry>>,
}

/// インメモリストア
///
/// `Clone` はストアの共有ハンドルを複製する（データは共有される）。
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, StoreState>, InfraError> {
        self.state
            .lock()
            .map_err(|_| InfraError::unexpected("ストアのロックが破損しています"))
    }
}

/// トランザクション内で積まれる書き込み
#[derive(Debug)]
pub(crate) enum StagedWrite {
    InsertInstance(WorkflowInstanceRecord),
    UpdateInstance {
        record:           WorkflowInstanceRecord,
        expected_version: Version,
    },
    AppendAudit(AuditEntry),
}

/// トランザクションコンテキスト
///
/// # ライフサイクル
///
/// 1. `TransactionManager::begin()` で作成
/// 2. 書き込みメソッドに `&mut TxContext` として渡す
/// 3. `commit()` でコミット、またはドロップで破棄
pub struct TxContext(TxContextInner);

enum TxContextInner {
    InMemory {
        store:  InMemoryStore,
        writes: Vec<StagedWrite>,
    },
    #[cfg(any(test, feature = "test-utils"))]
    Failing {
        message: String,
    },
}

impl TxContext {
    pub(crate) fn in_memory(store: InMemoryStore) -> Self {
        Self(TxContextInner::InMemory {
            store,
            writes: Vec::new(),
        })
    }

    /// コミット時に必ず失敗する TxContext を作成する
    #[cfg(any(test, feature = "test-utils"))]
    pub fn failing(message: impl Into<String>) -> Self {
        Self(TxContextInner::Failing {
            message: message.into(),
        })
    }

    pub(crate) fn stage(&mut self, write: StagedWrite) {
        match &mut self.0 {
            TxContextInner::InMemory { writes, .. } => writes.push(write),
            #[cfg(any(test, feature = "test-utils"))]
            TxContextInner::Failing { .. } => {}
        }
    }

    /// 積まれた書き込みを検証し、一括反映する
    ///
    /// # Errors
    ///
    /// - `Conflict`: ID 重複、バージョン不一致、監査連番の不一致
    /// - `Unexpected`: ストアのロックが破損している
    pub async fn commit(self) -> Result<(), InfraError> {
        match self.0 {
            TxContextInner::InMemory { store, writes } => {
                let mut state = store.lock()?;
                verify(&state, &writes)?;
                apply(&mut state, writes);
                Ok(())
            }
            #[cfg(any(test, feature = "test-utils"))]
            TxContextInner::Failing { message } => Err(InfraError::unavailable(message)),
        }
    }
}

fn verify(state: &StoreState, writes: &[StagedWrite]) -> Result<(), InfraError> {
    let mut versions: HashMap<&WorkflowInstanceId, Version> = HashMap::new();
    let mut sequences: HashMap<&WorkflowInstanceId, u32> = HashMap::new();

    for write in writes {
        match write {
            StagedWrite::InsertInstance(record) => {
                if state.instances.contains_key(&record.id) || versions.contains_key(&record.id) {
                    return Err(InfraError::conflict("WorkflowInstance", record.id.to_string()));
                }
                versions.insert(&record.id, record.version);
            }
            StagedWrite::UpdateInstance {
                record,
                expected_version,
            } => {
                let current = versions
                    .get(&record.id)
                    .copied()
                    .or_else(|| state.instances.get(&record.id).map(|r| r.version));
                if current != Some(*expected_version) {
                    return Err(InfraError::conflict("WorkflowInstance", record.id.to_string()));
                }
                versions.insert(&record.id, record.version);
            }
            StagedWrite::AppendAudit(entry) => {
                let id = entry.workflow_id();
                let last = sequences.get(id).copied().unwrap_or_else(|| {
                    state
                        .audit_trails
                        .get(id)
                        .and_then(|trail| trail.last())
                        .map_or(0, AuditEntry::sequence)
                });
                if entry.sequence() != last + 1 {
                    return Err(InfraError::conflict(
                        "AuditEntry",
                        format!("{id}#{}", entry.sequence()),
                    ));
                }
                sequences.insert(id, entry.sequence());
            }
        }
    }
    Ok(())
}

fn apply(state: &mut StoreState, writes: Vec<StagedWrite>) {
    for write in writes {
        match write {
            StagedWrite::InsertInstance(record) | StagedWrite::UpdateInstance { record, .. } => {
                state.instances.insert(record.id.clone(), record);
            }
            StagedWrite::AppendAudit(entry) => {
                state
                    .audit_trails
                    .entry(entry.workflow_id().clone())
                    .or_default()
                    .push(entry);
            }
        }
    }
}

/// トランザクション管理 trait
///
/// ユースケース層はストアに直接依存せず、この trait 経由でトランザクションを開始する。
#[async_trait]
pub trait TransactionManager: Send + Sync {
    /// トランザクションを開始し、TxContext を返す
    async fn begin(&self) -> Result<TxContext, InfraError>;
}

/// インメモリストア用 TransactionManager 実装
pub struct InMemoryTransactionManager {
    store: InMemoryStore,
}

impl InMemoryTransactionManager {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TransactionManager for InMemoryTransactionManager {
    async fn begin(&self) -> Result<TxContext, InfraError> {
        Ok(TxContext::in_memory(self.store.clone()))
    }
}
