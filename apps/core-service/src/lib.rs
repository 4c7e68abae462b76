//! # Core Service ライブラリ
//!
//! 承認ワークフローエンジンのユースケースとハンドラを公開する。
//! 統合テスト用に Router の組み立てとテストユーティリティを提供する。

pub mod app_builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;

// テストユーティリティ（内部実装、ドキュメントからは隠す）
#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_utils;
