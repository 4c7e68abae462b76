//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! 承認操作の監査とは別に、運用調査用の構造化ログを出力するための
//! フィールド命名規約とヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## エラーコンテキスト
//!
//! `tracing::error!` に `error.category` + `error.kind` フィールドを直接追加する。
//! 定数は [`error`] モジュールで提供。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`error.kind`）を使用する。JSON 出力では
//! フラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
///
/// ## 推奨フィールド
///
/// - `event.entity_type`: エンティティ種別（[`event::entity_type`] の定数を使用）
/// - `event.entity_id`: エンティティ ID
/// - `event.actor_id`: 操作者 ID
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const WORKFLOW: &str = "workflow";
        pub const EVENT_SINK: &str = "event_sink";
    }

    /// イベントアクション
    pub mod action {
        // ワークフロー
        pub const WORKFLOW_CREATED: &str = "workflow.created";
        pub const APPROVER_APPROVED: &str = "approver.approved";
        pub const APPROVER_REJECTED: &str = "approver.rejected";
        pub const APPROVER_DELEGATED: &str = "approver.delegated";
        pub const COMMENT_POSTED: &str = "comment.posted";
        pub const ACTION_REFUSED: &str = "action.refused";

        // イベント配信
        pub const EVENT_PUBLISHED: &str = "event.published";
        pub const EVENT_PUBLISH_FAILED: &str = "event.publish_failed";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const WORKFLOW_INSTANCE: &str = "workflow_instance";
        pub const AUDIT_ENTRY: &str = "audit_entry";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// 永続化ストア
        pub const INFRASTRUCTURE: &str = "infrastructure";
        /// 外部ケイパビリティ（権限判定、イベント配信）
        pub const EXTERNAL_CAPABILITY: &str = "external_capability";
    }

    /// エラー種別
    pub mod kind {
        pub const PERSISTENCE: &str = "persistence";
        pub const PERMISSION_CHECK: &str = "permission_check";
        pub const LOCK_TIMEOUT: &str = "lock_timeout";
        pub const INTERNAL: &str = "internal";
    }
}
