//! テストユーティリティ

mod workflow_test_builder;

pub use workflow_test_builder::*;
