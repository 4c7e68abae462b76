//! # ShoninFlow 共有ユーティリティ
//!
//! 承認ワークフローエンジンの各クレートで共有されるユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - domain / infra / core-service のいずれからも依存される
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - tracing-subscriber など重い依存は `observability` feature の裏に置く

pub mod api_response;
pub mod error_response;
pub mod event_log;
pub mod health;
pub mod observability;

pub use api_response::ApiResponse;
pub use error_response::ErrorResponse;
pub use health::HealthResponse;
