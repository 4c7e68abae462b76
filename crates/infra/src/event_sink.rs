//! # イベント配信
//!
//! コミット済みのワークフローイベントを外部へ送出する。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `EventSink` trait で配信先を抽象化
//! - **2 つの実装**: Noop（ログ出力のみ）、Channel（tokio mpsc でプロセス内の購読者へ）
//! - **環境変数切替**: `EVENT_SINK_BACKEND` でランタイム選択
//! - **fire-and-forget**: 配信の失敗はワークフロー操作の結果に影響しない

mod channel;
mod noop;

use async_trait::async_trait;
pub use channel::ChannelEventSink;
pub use noop::NoopEventSink;
use shoninflow_domain::event::WorkflowEvent;
use thiserror::Error;

/// イベント配信エラー
#[derive(Debug, Error)]
pub enum EventSinkError {
    /// 購読者がいない（チャネルが閉じている）
    #[error("イベントの購読者がいません")]
    Closed,

    /// 配信先がイベントを受け付けなかった
    #[error("イベント配信に失敗: {0}")]
    Rejected(String),
}

/// イベント配信トレイト
#[async_trait]
pub trait EventSink: Send + Sync {
    /// イベントを配信する
    async fn publish(&self, event: &WorkflowEvent) -> Result<(), EventSinkError>;
}
