//! # ドメイン層エラー定義
//!
//! - [`DomainError`]: 値オブジェクトやエンティティの不変条件違反
//! - [`ApprovalError`]: 承認アクションがビジネスルール上受け付けられない場合
//!
//! どちらも純粋なエラーであり、永続化や並行制御に起因するエラーは
//! 上位層（infra / core-service）で定義する。
//!
//! ## 安定コード
//!
//! [`ApprovalError::code`] は API のエラーレスポンスにそのまま載る
//! snake_case の文字列を返す。呼び出し側はこのコードで分岐する。
//!
//! ## 使用例
//!
//! ```rust
//! use shoninflow_domain::{ApprovalError, DomainError};
//!
//! let error = ApprovalError::MissingRejectionReason;
//! assert_eq!(error.code(), "missing_rejection_reason");
//!
//! let error: ApprovalError = DomainError::Validation("x".to_string()).into();
//! assert_eq!(error.code(), "bad_request");
//! ```

use thiserror::Error;

use crate::{value_objects::ApproverId, workflow::WorkflowStatus};

/// ドメイン層で発生するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値や復元データがドメインの不変条件を満たさない場合に使用する。
    ///
    /// # 例
    ///
    /// - 承認者リストが空、または重複を含む
    /// - 条件ルールの承認者が必須承認者に含まれない
    /// - 保存済みステータスが承認状況から導出される値と一致しない
    #[error("バリデーションエラー: {0}")]
    Validation(String),
}

/// 承認アクションの拒否理由
///
/// アクション処理は検証に失敗するとこのエラーを返し、インスタンスは変更されない。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApprovalError {
    /// 操作者が現在の承認可能者に含まれない
    #[error("{actor} は現在このワークフローで操作できません")]
    NotEligible { actor: ApproverId },

    /// ワークフローが既に終了している（承認済み / 却下済み）
    #[error("ワークフローは既に終了しています（ステータス: {status}）")]
    WorkflowClosed { status: WorkflowStatus },

    /// 委任先が不正（未指定、既に必須承認者に含まれる等）
    #[error("委任先が不正です: {0}")]
    InvalidDelegate(String),

    /// 却下に理由コメントがない
    #[error("却下には理由コメントが必要です")]
    MissingRejectionReason,

    /// アクション入力がドメインの不変条件を満たさない
    #[error(transparent)]
    Validation(#[from] DomainError),
}

impl ApprovalError {
    /// API に公開する安定コード
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotEligible { .. } => "not_eligible",
            Self::WorkflowClosed { .. } => "workflow_closed",
            Self::InvalidDelegate(_) => "invalid_delegate",
            Self::MissingRejectionReason => "missing_rejection_reason",
            Self::Validation(_) => "bad_request",
        }
    }
}
