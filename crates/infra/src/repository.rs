//! # リポジトリ
//!
//! 永続化操作をトレイトで定義し、インメモリ実装を提供する。
//!
//! ## 設計方針
//!
//! - **トレイト経由の注入**: ユースケース層は `Arc<dyn XxxRepository>` に依存する
//! - **書き込みはトランザクション必須**: 書き込みメソッドは `&mut TxContext` を受け取る
//! - **復元時の検証**: 保存済みレコードはドメインの `from_record` を通して復元する

pub mod audit_trail_repository;
pub mod workflow_instance_repository;
pub mod workflow_template_repository;

pub use audit_trail_repository::{AuditTrailRepository, InMemoryAuditTrailRepository};
pub use workflow_instance_repository::{
    InMemoryWorkflowInstanceRepository,
    WorkflowInstanceRepository,
};
pub use workflow_template_repository::{
    StaticWorkflowTemplateRepository,
    WorkflowTemplateRepository,
};
