//! # ShoninFlow ドメイン層
//!
//! 承認ワークフローエンジンのビジネスロジックを定義する。
//!
//! ## 設計方針
//!
//! - **純粋性**: 永続化・HTTP・時刻取得には依存しない。時刻は呼び出し側から
//!   引数で受け取る（[`clock::Clock`] はユースケース層で注入する）
//! - **導出ステータス**: ワークフローのステータスは承認状況から常に再計算され、
//!   外部から直接設定されることはない
//! - **所有権による遷移**: 状態遷移は `self` を消費して新しいインスタンスを返す
//!
//! ## 依存関係の方向
//!
//! ```text
//! core-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`workflow`] - ワークフローインスタンス、ルーティング、アクション処理、スケジューリング
//! - [`audit_log`] - 追記専用の監査エントリ
//! - [`event`] - コミット後に配信されるワークフローイベント
//! - [`value_objects`] - 承認者 ID、優先度、バージョンなどの値オブジェクト
//! - [`error`] - ドメインエラーと承認エラー
//!
//! ## 使用例
//!
//! ```rust
//! use shoninflow_domain::{DomainError, value_objects::ApproverId};
//!
//! let approver = ApproverId::new("pm-1").unwrap();
//! assert_eq!(approver.as_str(), "pm-1");
//!
//! let error = ApproverId::new("   ").unwrap_err();
//! assert!(matches!(error, DomainError::Validation(_)));
//! ```

#[macro_use]
mod macros;

pub mod audit_log;
pub mod clock;
pub mod error;
pub mod event;
pub mod value_objects;
pub mod workflow;

pub use error::{ApprovalError, DomainError};
