//! Channel イベント配信実装
//!
//! tokio の mpsc チャネルでプロセス内の購読者にイベントを渡す。
//! バッファが満杯の場合は送信側を待たせずに配信失敗とする。

use async_trait::async_trait;
use shoninflow_domain::event::WorkflowEvent;
use tokio::sync::mpsc::{self, error::TrySendError};

use super::{EventSink, EventSinkError};

#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    sender: mpsc::Sender<WorkflowEvent>,
}

impl ChannelEventSink {
    /// 指定容量のチャネルを作成し、配信側と受信側を返す
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<WorkflowEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl EventSink for ChannelEventSink {
    async fn publish(&self, event: &WorkflowEvent) -> Result<(), EventSinkError> {
        self.sender.try_send(event.clone()).map_err(|e| match e {
            TrySendError::Closed(_) => EventSinkError::Closed,
            TrySendError::Full(_) => {
                EventSinkError::Rejected("イベントバッファが満杯です".to_string())
            }
        })
    }
}
