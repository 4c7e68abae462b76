//! # ワークフローインスタンス
//!
//! 1 つのドキュメントに対する承認プロセスを表す。
//!
//! ステータスは判断履歴から導出され（[`super::status::derive_status`]）、
//! 呼び出し側から直接設定する手段はない。状態遷移は `self` を消費して
//! 新しいインスタンスを返し、そのたびにバージョンが 1 つ進む。

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use strum::IntoStaticStr;

use super::{
    router::{self, ApprovalProgress},
    status::derive_status,
    strategy::RoutingStrategy,
};
use crate::{
    DomainError,
    value_objects::{ApproverId, DocumentRef, Priority, ProjectRef, Version},
};

define_uuid_id! {
    /// ワークフローインスタンス ID
    pub struct WorkflowInstanceId;
}

/// ワークフローステータス
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkflowStatus {
    /// 判断が 1 件もない
    Pending,
    /// 承認が 1 件以上あり、未完了
    InReview,
    /// 承認完了（終了状態）
    Approved,
    /// 却下（終了状態）
    Rejected,
}

impl WorkflowStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl std::str::FromStr for WorkflowStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_review" => Ok(Self::InReview),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(DomainError::Validation(format!(
                "不正なワークフローステータス: {s}"
            ))),
        }
    }
}

/// 承認者ごとの判断結果
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DecisionOutcome {
    Approved,
    Rejected,
}

/// 承認者の判断記録
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproverDecision {
    pub approver:   ApproverId,
    pub outcome:    DecisionOutcome,
    pub decided_at: DateTime<Utc>,
}

/// ワークフローインスタンス
///
/// ## 楽観的ロック
///
/// `version` はアクションが受理されるたびに進む。永続化層は保存時に
/// 読み込み時点のバージョンと比較し、一致しなければ競合として扱う。
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowInstance {
    id: WorkflowInstanceId,
    document_ref: DocumentRef,
    project_ref: Option<ProjectRef>,
    strategy: RoutingStrategy,
    required_approvers: Vec<ApproverId>,
    decisions: Vec<ApproverDecision>,
    document_attributes: JsonValue,
    priority: Priority,
    status: WorkflowStatus,
    version: Version,
    estimated_completion_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

/// ワークフローインスタンスの新規作成パラメータ
pub struct NewWorkflowInstance {
    pub id: WorkflowInstanceId,
    pub document_ref: DocumentRef,
    pub project_ref: Option<ProjectRef>,
    pub strategy: RoutingStrategy,
    pub required_approvers: Vec<ApproverId>,
    pub document_attributes: JsonValue,
    pub priority: Priority,
    pub estimated_completion_at: Option<DateTime<Utc>>,
    pub now: DateTime<Utc>,
}

/// ワークフローインスタンスの永続化表現
///
/// `status` は導出値のキャッシュとして保存される。
/// [`WorkflowInstance::from_record`] で判断履歴から再導出し、食い違えばエラーにする。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInstanceRecord {
    pub id: WorkflowInstanceId,
    pub document_ref: DocumentRef,
    pub project_ref: Option<ProjectRef>,
    pub strategy: RoutingStrategy,
    pub required_approvers: Vec<ApproverId>,
    pub decisions: Vec<ApproverDecision>,
    pub document_attributes: JsonValue,
    pub priority: Priority,
    pub status: WorkflowStatus,
    pub version: Version,
    pub estimated_completion_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowInstance {
    /// 新しいワークフローインスタンスを作成する
    ///
    /// # Errors
    ///
    /// - 必須承認者が空、または重複を含む
    /// - 条件ルールの承認者が必須承認者に含まれない
    /// - ドキュメント属性がオブジェクトでない
    pub fn new(params: NewWorkflowInstance) -> Result<Self, DomainError> {
        let document_attributes = normalize_attributes(params.document_attributes)?;
        validate_approvers(&params.required_approvers)?;
        params
            .strategy
            .validate_against(&params.required_approvers)?;

        Ok(Self {
            id: params.id,
            document_ref: params.document_ref,
            project_ref: params.project_ref,
            strategy: params.strategy,
            required_approvers: params.required_approvers,
            decisions: Vec::new(),
            document_attributes,
            priority: params.priority,
            status: WorkflowStatus::Pending,
            version: Version::initial(),
            estimated_completion_at: params.estimated_completion_at,
            created_at: params.now,
            updated_at: params.now,
            completed_at: None,
        })
    }

    /// 永続化表現から復元する
    ///
    /// # Errors
    ///
    /// - `new()` と同じ検証に失敗した
    /// - 判断者が必須承認者に含まれない、または同一承認者の判断が重複している
    /// - 保存済みステータスが判断履歴から導出される値と一致しない
    /// - 終了状態と `completed_at` の有無が一致しない
    pub fn from_record(record: WorkflowInstanceRecord) -> Result<Self, DomainError> {
        let document_attributes = normalize_attributes(record.document_attributes)?;
        validate_approvers(&record.required_approvers)?;
        record
            .strategy
            .validate_against(&record.required_approvers)?;

        let mut decided = HashSet::new();
        for decision in &record.decisions {
            if !record.required_approvers.contains(&decision.approver) {
                return Err(DomainError::Validation(format!(
                    "判断者 {} が必須承認者に含まれていません",
                    decision.approver
                )));
            }
            if !decided.insert(&decision.approver) {
                return Err(DomainError::Validation(format!(
                    "承認者 {} の判断が重複しています",
                    decision.approver
                )));
            }
        }

        let derived = derive_status(&ApprovalProgress {
            strategy:            &record.strategy,
            required_approvers:  &record.required_approvers,
            decisions:           &record.decisions,
            document_attributes: &document_attributes,
        });
        if derived != record.status {
            return Err(DomainError::Validation(format!(
                "保存済みステータス {} が判断履歴から導出される {} と一致しません",
                record.status, derived
            )));
        }
        if derived.is_terminal() != record.completed_at.is_some() {
            return Err(DomainError::Validation(
                "終了状態のインスタンスにのみ completed_at が必要です".to_string(),
            ));
        }

        Ok(Self {
            id: record.id,
            document_ref: record.document_ref,
            project_ref: record.project_ref,
            strategy: record.strategy,
            required_approvers: record.required_approvers,
            decisions: record.decisions,
            document_attributes,
            priority: record.priority,
            status: derived,
            version: record.version,
            estimated_completion_at: record.estimated_completion_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
            completed_at: record.completed_at,
        })
    }

    /// 永続化表現に変換する
    pub fn to_record(&self) -> WorkflowInstanceRecord {
        WorkflowInstanceRecord {
            id: self.id.clone(),
            document_ref: self.document_ref.clone(),
            project_ref: self.project_ref.clone(),
            strategy: self.strategy.clone(),
            required_approvers: self.required_approvers.clone(),
            decisions: self.decisions.clone(),
            document_attributes: self.document_attributes.clone(),
            priority: self.priority,
            status: self.status,
            version: self.version,
            estimated_completion_at: self.estimated_completion_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> &WorkflowInstanceId {
        &self.id
    }

    pub fn document_ref(&self) -> &DocumentRef {
        &self.document_ref
    }

    pub fn project_ref(&self) -> Option<&ProjectRef> {
        self.project_ref.as_ref()
    }

    pub fn strategy(&self) -> &RoutingStrategy {
        &self.strategy
    }

    pub fn required_approvers(&self) -> &[ApproverId] {
        &self.required_approvers
    }

    pub fn decisions(&self) -> &[ApproverDecision] {
        &self.decisions
    }

    pub fn document_attributes(&self) -> &JsonValue {
        &self.document_attributes
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn status(&self) -> WorkflowStatus {
        self.status
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn estimated_completion_at(&self) -> Option<DateTime<Utc>> {
        self.estimated_completion_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// 判断済みの承認者（判断順）
    pub fn completed_approvers(&self) -> impl Iterator<Item = &ApproverId> {
        self.decisions.iter().map(|d| &d.approver)
    }

    pub fn progress(&self) -> ApprovalProgress<'_> {
        ApprovalProgress {
            strategy:            &self.strategy,
            required_approvers:  &self.required_approvers,
            decisions:           &self.decisions,
            document_attributes: &self.document_attributes,
        }
    }

    /// 現時点でアクション可能な承認者
    pub fn eligible_approvers(&self) -> Vec<ApproverId> {
        router::eligible_approvers(&self.progress())
    }

    /// 承認完了に必要な承認者（`Conditional` ではルールで絞り込まれる）
    pub fn effective_required_approvers(&self) -> Vec<ApproverId> {
        router::effective_required_approvers(&self.progress())
    }

    pub fn is_eligible(&self, approver: &ApproverId) -> bool {
        self.eligible_approvers().contains(approver)
    }

    // 状態遷移メソッド

    /// 承認者の判断を記録する
    ///
    /// # Errors
    ///
    /// 承認者が必須承認者に含まれない、または既に判断済みの場合。
    pub(crate) fn decided(
        mut self,
        approver: &ApproverId,
        outcome: DecisionOutcome,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if !self.required_approvers.contains(approver) {
            return Err(DomainError::Validation(format!(
                "{approver} は必須承認者に含まれていません"
            )));
        }
        if self.decisions.iter().any(|d| &d.approver == approver) {
            return Err(DomainError::Validation(format!(
                "{approver} は既に判断済みです"
            )));
        }

        self.decisions.push(ApproverDecision {
            approver: approver.clone(),
            outcome,
            decided_at: now,
        });
        Ok(self.advanced(now))
    }

    /// 必須承認者を差し替える（委任）
    ///
    /// 委任先は委任元と同じ位置に入り、条件ルール内の参照も差し替わる。
    /// 委任元の判断が記録済みであれば委任先に引き継がれる。
    ///
    /// # Errors
    ///
    /// 委任元が必須承認者に含まれない、または委任先が既に含まれる場合。
    pub(crate) fn delegated(
        self,
        from: &ApproverId,
        to: &ApproverId,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if !self.required_approvers.contains(from) {
            return Err(DomainError::Validation(format!(
                "{from} は必須承認者に含まれていません"
            )));
        }
        if self.required_approvers.contains(to) {
            return Err(DomainError::Validation(format!(
                "{to} は既に必須承認者に含まれています"
            )));
        }

        let replace = |a: ApproverId| if &a == from { to.clone() } else { a };
        let instance = Self {
            required_approvers: self.required_approvers.into_iter().map(replace).collect(),
            decisions: self
                .decisions
                .into_iter()
                .map(|d| ApproverDecision {
                    approver: replace(d.approver),
                    ..d
                })
                .collect(),
            strategy: self.strategy.with_approver_replaced(from, to),
            ..self
        };
        Ok(instance.advanced(now))
    }

    /// 判断を伴わない操作（コメント）を記録する
    pub(crate) fn annotated(self, now: DateTime<Utc>) -> Self {
        self.advanced(now)
    }

    /// バージョンを進め、ステータスを再導出する
    fn advanced(self, now: DateTime<Utc>) -> Self {
        let status = derive_status(&self.progress());
        let completed_at = match self.completed_at {
            Some(at) => Some(at),
            None if status.is_terminal() => Some(now),
            None => None,
        };
        Self {
            status,
            version: self.version.next(),
            updated_at: now,
            completed_at,
            ..self
        }
    }
}

fn validate_approvers(approvers: &[ApproverId]) -> Result<(), DomainError> {
    if approvers.is_empty() {
        return Err(DomainError::Validation(
            "必須承認者は 1 人以上必要です".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    if let Some(duplicate) = approvers.iter().find(|a| !seen.insert(*a)) {
        return Err(DomainError::Validation(format!(
            "必須承認者 {duplicate} が重複しています"
        )));
    }
    Ok(())
}

/// `null` は空オブジェクトとして扱う
fn normalize_attributes(attributes: JsonValue) -> Result<JsonValue, DomainError> {
    match attributes {
        JsonValue::Null => Ok(JsonValue::Object(serde_json::Map::new())),
        JsonValue::Object(_) => Ok(attributes),
        _ => Err(DomainError::Validation(
            "ドキュメント属性は JSON オブジェクトである必要があります".to_string(),
        )),
    }
}
