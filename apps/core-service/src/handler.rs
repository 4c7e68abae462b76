//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ビジネスロジックはユースケース層とドメイン層に委譲

pub mod health;
pub mod workflow;
pub mod workflow_template;

pub use health::health_check;
pub use workflow::{
    WorkflowState,
    apply_action,
    create_workflow,
    create_workflow_from_template,
    get_eligible_approvers,
    get_history,
    get_workflow,
    list_pending_approvals,
};
pub use workflow_template::list_workflow_templates;
