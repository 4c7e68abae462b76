//! # 監査ログ
//!
//! 受理された承認アクションの追記専用の記録。
//!
//! ## 設計方針
//!
//! - **不変性**: 一度作成された監査エントリは変更されない（setter を持たない）
//! - **連番**: `sequence` はインスタンスごとに 1 から始まる連番。
//!   アクション処理後のインスタンスバージョンから 1 を引いた値になる
//! - **原子性**: 監査エントリはインスタンスの状態変更と同じ単位でコミットされる。
//!   拒否されたアクションは監査エントリを生成しない

use chrono::{DateTime, Utc};

use crate::{
    value_objects::ApproverId,
    workflow::{ActionType, WorkflowInstanceId},
};

/// 監査エントリの作成パラメータ
pub struct NewAuditEntry {
    pub workflow_id: WorkflowInstanceId,
    pub sequence:    u32,
    pub actor_id:    ApproverId,
    pub action_type: ActionType,
    pub comment:     Option<String>,
    pub delegate_to: Option<ApproverId>,
    pub timestamp:   DateTime<Utc>,
}

/// 監査エントリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    workflow_id: WorkflowInstanceId,
    sequence:    u32,
    actor_id:    ApproverId,
    action_type: ActionType,
    comment:     Option<String>,
    delegate_to: Option<ApproverId>,
    timestamp:   DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(params: NewAuditEntry) -> Self {
        Self {
            workflow_id: params.workflow_id,
            sequence:    params.sequence,
            actor_id:    params.actor_id,
            action_type: params.action_type,
            comment:     params.comment,
            delegate_to: params.delegate_to,
            timestamp:   params.timestamp,
        }
    }

    pub fn workflow_id(&self) -> &WorkflowInstanceId {
        &self.workflow_id
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn actor_id(&self) -> &ApproverId {
        &self.actor_id
    }

    pub fn action_type(&self) -> ActionType {
        self.action_type
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn delegate_to(&self) -> Option<&ApproverId> {
        self.delegate_to.as_ref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_newで全フィールドが保持される() {
        let workflow_id = WorkflowInstanceId::new();
        let timestamp = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        let entry = AuditEntry::new(NewAuditEntry {
            workflow_id: workflow_id.clone(),
            sequence: 2,
            actor_id: ApproverId::new("pm-1").unwrap(),
            action_type: ActionType::Delegate,
            comment: Some("出張のため".to_string()),
            delegate_to: Some(ApproverId::new("pm-2").unwrap()),
            timestamp,
        });

        assert_eq!(entry.workflow_id(), &workflow_id);
        assert_eq!(entry.sequence(), 2);
        assert_eq!(entry.actor_id().as_str(), "pm-1");
        assert_eq!(entry.action_type(), ActionType::Delegate);
        assert_eq!(entry.comment(), Some("出張のため"));
        assert_eq!(entry.delegate_to().map(ApproverId::as_str), Some("pm-2"));
        assert_eq!(entry.timestamp(), timestamp);
    }
}
