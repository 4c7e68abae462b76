//! # ワークフロー
//!
//! 承認ワークフローの中核となるモデルと純粋なロジックを提供する。
//!
//! ## 構成
//!
//! - **strategy**: ルーティング戦略と条件ルール
//! - **instance**: ワークフローインスタンスと判断記録
//! - **router**: 現時点の承認可能者の算出
//! - **status**: 判断履歴からのステータス導出
//! - **action**: 承認アクションの検証と適用
//! - **scheduler**: 承認待ち一覧の並べ替え
//! - **template**: ドキュメント種別ごとの既定ルーティング
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use chrono::Utc;
//! use serde_json::json;
//! use shoninflow_domain::{
//!     value_objects::{ApproverId, DocumentRef, Priority},
//!     workflow::{
//!         ActionType, ApprovalAction, NewWorkflowInstance, RoutingStrategy, WorkflowInstance,
//!         WorkflowInstanceId, WorkflowStatus, process_action,
//!     },
//! };
//!
//! let now = Utc::now();
//! let instance = WorkflowInstance::new(NewWorkflowInstance {
//!     id: WorkflowInstanceId::new(),
//!     document_ref: DocumentRef::new("doc-1")?,
//!     project_ref: None,
//!     strategy: RoutingStrategy::Sequential,
//!     required_approvers: vec![ApproverId::new("pm-1")?, ApproverId::new("dir-1")?],
//!     document_attributes: json!({}),
//!     priority: Priority::Normal,
//!     estimated_completion_at: None,
//!     now,
//! })?;
//!
//! let action = ApprovalAction {
//!     workflow_id: instance.id().clone(),
//!     actor_id: ApproverId::new("pm-1")?,
//!     action_type: ActionType::Approve,
//!     comment: None,
//!     delegate_to: None,
//! };
//! let outcome = process_action(instance, &action, now)?;
//! assert_eq!(outcome.instance.status(), WorkflowStatus::InReview);
//! assert_eq!(outcome.instance.eligible_approvers(), vec![ApproverId::new("dir-1")?]);
//! # Ok(())
//! # }
//! ```

mod action;
mod instance;
pub mod router;
mod scheduler;
pub mod status;
mod strategy;
mod template;

pub use action::*;
pub use instance::*;
pub use router::ApprovalProgress;
pub use scheduler::*;
pub use status::derive_status;
pub use strategy::*;
pub use template::*;
