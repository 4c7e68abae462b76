//! # ユースケース層
//!
//! Core Service のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリと外部ケイパビリティを `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約
//! - **判定はドメイン層**: 承認可否とステータス導出はドメインの純粋関数に委譲し、
//!   ユースケースは直列化・永続化・イベント配信のみを担う
//!
//! ## モジュール構成
//!
//! - `workflow`: ワークフロー関連のユースケース

pub(crate) mod helpers;

pub mod workflow;

pub use workflow::{
    CreateFromTemplateInput,
    CreateWorkflowInput,
    InstanceLockRegistry,
    PendingApprovalFilter,
    WorkflowUseCaseDeps,
    WorkflowUseCaseImpl,
};
