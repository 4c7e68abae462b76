//! # ShoninFlow インフラ層
//!
//! ドメイン層の外側にある永続化と外部ケイパビリティの実装を提供する。
//!
//! ## 責務
//!
//! - **ストア**: インスタンスと監査証跡を保持するインメモリストアと、
//!   バージョン検査付きの原子的コミット（[`store`]）
//! - **リポジトリ**: トレイトとインメモリ実装（[`repository`]）
//! - **権限判定**: アクター単位のアクセス可否（[`permission`]）
//! - **イベント配信**: コミット後のワークフローイベント送出（[`event_sink`]）
//!
//! ## 依存関係
//!
//! ```text
//! core-service → infra → domain
//! ```
//!
//! ## 使用例
//!
//! ```rust
//! use shoninflow_infra::{
//!     repository::{InMemoryWorkflowInstanceRepository, WorkflowInstanceRepository},
//!     store::InMemoryStore,
//! };
//!
//! let store = InMemoryStore::new();
//! let repo = InMemoryWorkflowInstanceRepository::new(store.clone());
//! # let _ = repo;
//! ```

pub mod error;
pub mod event_sink;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod permission;
pub mod repository;
pub mod store;

pub use error::{InfraError, InfraErrorKind};
pub use event_sink::{ChannelEventSink, EventSink, EventSinkError, NoopEventSink};
pub use permission::{AllowAllPermissionChecker, PermissionChecker, StaticPermissionChecker};
pub use store::{InMemoryStore, InMemoryTransactionManager, TransactionManager, TxContext};
