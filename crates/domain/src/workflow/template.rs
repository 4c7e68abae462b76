//! # ワークフローテンプレート
//!
//! ドキュメント種別ごとの既定ルーティング（戦略・承認者・条件ルール・SLA）。
//! テンプレートからインスタンスを作成する際、明示指定がなければ既定値が使われる。

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::strategy::RoutingStrategy;
use crate::{DomainError, value_objects::ApproverId};

define_uuid_id! {
    /// ワークフローテンプレート ID
    pub struct WorkflowTemplateId;
}

/// ワークフローテンプレート
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    pub id:                WorkflowTemplateId,
    /// 一意なドキュメント種別（例: `purchase_request`）
    pub document_type:     String,
    pub name:              String,
    pub default_strategy:  RoutingStrategy,
    pub default_approvers: Vec<ApproverId>,
    /// 作成から完了予定までの日数
    #[serde(default)]
    pub sla_days:          Option<u32>,
}

impl WorkflowTemplate {
    /// テンプレート定義を検証する
    ///
    /// インスタンス作成時と同じく、承認者は 1 人以上かつ重複なし、
    /// ルールの承認者は既定承認者に含まれている必要がある。
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.document_type.trim().is_empty() {
            return Err(DomainError::Validation(
                "テンプレートのドキュメント種別は必須です".to_string(),
            ));
        }
        if self.default_approvers.is_empty() {
            return Err(DomainError::Validation(format!(
                "テンプレート {} には既定承認者が必要です",
                self.document_type
            )));
        }
        for (i, approver) in self.default_approvers.iter().enumerate() {
            if self.default_approvers[..i].contains(approver) {
                return Err(DomainError::Validation(format!(
                    "テンプレート {} の既定承認者 {approver} が重複しています",
                    self.document_type
                )));
            }
        }
        self.default_strategy
            .validate_against(&self.default_approvers)
    }

    /// SLA 日数から完了予定日時を算出する
    pub fn estimated_completion_from(&self, created_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.sla_days
            .map(|days| created_at + Duration::days(i64::from(days)))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;

    #[fixture]
    fn template() -> WorkflowTemplate {
        serde_json::from_value(json!({
            "id": "0190f2c4-0000-7000-8000-000000000001",
            "document_type": "purchase_request",
            "name": "購買申請",
            "default_strategy": {"type": "sequential"},
            "default_approvers": ["pm-1", "dir-1"],
            "sla_days": 3
        }))
        .unwrap()
    }

    #[rstest]
    fn test_jsonから読み込める(template: WorkflowTemplate) {
        assert_eq!(template.document_type, "purchase_request");
        assert_eq!(template.default_strategy, RoutingStrategy::Sequential);
        assert_eq!(template.default_approvers.len(), 2);
        assert!(template.validate().is_ok());
    }

    #[rstest]
    fn test_sla日数から完了予定日時を算出する(template: WorkflowTemplate) {
        let created_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        assert_eq!(
            template.estimated_completion_from(created_at),
            Some(created_at + Duration::days(3))
        );
    }

    #[rstest]
    fn test_sla未設定なら完了予定なし(template: WorkflowTemplate) {
        let template = WorkflowTemplate {
            sla_days: None,
            ..template
        };

        assert_eq!(template.estimated_completion_from(Utc::now()), None);
    }

    #[rstest]
    fn test_既定承認者の重複は拒否する(template: WorkflowTemplate) {
        let pm = ApproverId::new("pm-1").unwrap();
        let template = WorkflowTemplate {
            default_approvers: vec![pm.clone(), pm],
            ..template
        };

        assert!(template.validate().is_err());
    }
}
