//! # Core Service エラー定義
//!
//! Core Service 固有のエラーと、HTTP レスポンスへの変換を定義する。
//!
//! レスポンスの `detail` には内部情報（ロック、ストアの識別子、
//! InfraError の本文）を含めない。これらはログにのみ出力する。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shoninflow_domain::{ApprovalError, DomainError};
use shoninflow_infra::InfraError;
use shoninflow_shared::{ErrorResponse, event_log::error};
use strum::IntoStaticStr;
use thiserror::Error;

/// API に公開するエラー種別
///
/// 文字列表現がそのまま安定コードになる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    NotEligible,
    WorkflowClosed,
    InvalidDelegate,
    MissingRejectionReason,
    ConcurrentModification,
    PersistenceFailure,
    NotFound,
    BadRequest,
    Forbidden,
    Internal,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        self.into()
    }

    pub fn status(self) -> StatusCode {
        match self {
            Self::NotEligible | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::WorkflowClosed | Self::ConcurrentModification => StatusCode::CONFLICT,
            Self::InvalidDelegate | Self::MissingRejectionReason | Self::BadRequest => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::PersistenceFailure => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::NotEligible => "Not Eligible",
            Self::WorkflowClosed => "Workflow Closed",
            Self::InvalidDelegate => "Invalid Delegate",
            Self::MissingRejectionReason => "Missing Rejection Reason",
            Self::ConcurrentModification => "Concurrent Modification",
            Self::PersistenceFailure => "Persistence Failure",
            Self::NotFound => "Not Found",
            Self::BadRequest => "Bad Request",
            Self::Forbidden => "Forbidden",
            Self::Internal => "Internal Server Error",
        }
    }

    /// 呼び出し側が最新状態を取得し直して再試行できるか
    pub fn is_retriable(self) -> bool {
        matches!(self, Self::ConcurrentModification | Self::PersistenceFailure)
    }
}

/// Core Service で発生するエラー
#[derive(Debug, Error)]
pub enum CoreError {
    /// 承認アクションがドメインの検証で拒否された
    #[error(transparent)]
    Approval(#[from] ApprovalError),

    /// 同一インスタンスへの書き込みが競合した
    #[error("競合が発生しました: {0}")]
    ConcurrentModification(String),

    /// 永続化ストアの呼び出しに失敗
    #[error("永続化に失敗しました: {0}")]
    PersistenceFailure(#[source] InfraError),

    /// リソースが見つからない
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 不正なリクエスト
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// 権限不足
    #[error("権限がありません: {0}")]
    Forbidden(String),

    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Approval(e) => match e {
                ApprovalError::NotEligible { .. } => ErrorKind::NotEligible,
                ApprovalError::WorkflowClosed { .. } => ErrorKind::WorkflowClosed,
                ApprovalError::InvalidDelegate(_) => ErrorKind::InvalidDelegate,
                ApprovalError::MissingRejectionReason => ErrorKind::MissingRejectionReason,
                ApprovalError::Validation(_) => ErrorKind::BadRequest,
            },
            CoreError::ConcurrentModification(_) => ErrorKind::ConcurrentModification,
            CoreError::PersistenceFailure(_) => ErrorKind::PersistenceFailure,
            CoreError::NotFound(_) => ErrorKind::NotFound,
            CoreError::BadRequest(_) => ErrorKind::BadRequest,
            CoreError::Forbidden(_) => ErrorKind::Forbidden,
            CoreError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// 呼び出し側に返す説明文
    fn public_detail(&self) -> String {
        match self {
            CoreError::Approval(e) => e.to_string(),
            CoreError::NotFound(msg) | CoreError::BadRequest(msg) | CoreError::Forbidden(msg) => {
                msg.clone()
            }
            CoreError::ConcurrentModification(_) => {
                "ワークフローは他の操作で更新されました。最新の状態を取得して再試行してください。"
                    .to_string()
            }
            CoreError::PersistenceFailure(_) => {
                "データの保存に失敗しました。最新の状態を取得して再試行してください。".to_string()
            }
            CoreError::Internal(_) => "内部エラーが発生しました".to_string(),
        }
    }
}

/// リクエスト値の検証エラーは BadRequest として扱う
impl From<DomainError> for CoreError {
    fn from(e: DomainError) -> Self {
        CoreError::BadRequest(e.to_string())
    }
}

impl From<CoreError> for ErrorResponse {
    fn from(e: CoreError) -> Self {
        let kind = e.kind();
        if kind == ErrorKind::Internal {
            return ErrorResponse::internal_error();
        }
        ErrorResponse::new(
            kind.code(),
            kind.title(),
            kind.status().as_u16(),
            e.public_detail(),
        )
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        match &self {
            CoreError::PersistenceFailure(e) => {
                tracing::error!(
                    error.category = error::category::INFRASTRUCTURE,
                    error.kind = error::kind::PERSISTENCE,
                    "永続化エラー: {}\n{}",
                    e,
                    e.span_trace()
                );
            }
            CoreError::ConcurrentModification(msg) => {
                tracing::warn!("競合: {}", msg);
            }
            CoreError::Internal(msg) => {
                tracing::error!(
                    error.category = error::category::INFRASTRUCTURE,
                    error.kind = error::kind::INTERNAL,
                    "内部エラー: {}",
                    msg
                );
            }
            _ => {}
        }

        let status = self.kind().status();
        (status, Json(ErrorResponse::from(self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use shoninflow_domain::{value_objects::ApproverId, workflow::WorkflowStatus};

    use super::*;

    #[rstest]
    #[case(ErrorKind::NotEligible, "not_eligible", 403)]
    #[case(ErrorKind::WorkflowClosed, "workflow_closed", 409)]
    #[case(ErrorKind::InvalidDelegate, "invalid_delegate", 400)]
    #[case(ErrorKind::MissingRejectionReason, "missing_rejection_reason", 400)]
    #[case(ErrorKind::ConcurrentModification, "concurrent_modification", 409)]
    #[case(ErrorKind::PersistenceFailure, "persistence_failure", 503)]
    #[case(ErrorKind::NotFound, "not_found", 404)]
    #[case(ErrorKind::BadRequest, "bad_request", 400)]
    #[case(ErrorKind::Forbidden, "forbidden", 403)]
    #[case(ErrorKind::Internal, "internal", 500)]
    fn test_エラー種別ごとの安定コードとステータス(
        #[case] kind: ErrorKind,
        #[case] code: &str,
        #[case] status: u16,
    ) {
        assert_eq!(kind.code(), code);
        assert_eq!(kind.status().as_u16(), status);
    }

    #[test]
    fn test_承認エラーは対応する種別に変換される() {
        let not_eligible: CoreError = ApprovalError::NotEligible {
            actor: ApproverId::new("dir-1").unwrap(),
        }
        .into();
        let closed: CoreError = ApprovalError::WorkflowClosed {
            status: WorkflowStatus::Rejected,
        }
        .into();
        let validation: CoreError =
            ApprovalError::Validation(DomainError::Validation("x".to_string())).into();

        assert_eq!(not_eligible.kind(), ErrorKind::NotEligible);
        assert_eq!(closed.kind(), ErrorKind::WorkflowClosed);
        assert_eq!(validation.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_ドメインの検証エラーはbadrequestになる() {
        let error: CoreError = DomainError::Validation("不正な優先度: 9".to_string()).into();

        assert_eq!(error.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_永続化エラーの詳細はレスポンスに含まれない() {
        let error = CoreError::PersistenceFailure(InfraError::unavailable("store-shard-7"));

        let response = ErrorResponse::from(error);

        assert_eq!(response.code, "persistence_failure");
        assert_eq!(response.status, 503);
        assert!(!response.detail.contains("store-shard-7"));
    }

    #[test]
    fn test_競合エラーの詳細はレスポンスに含まれない() {
        let error = CoreError::ConcurrentModification("instance lock 0191".to_string());

        let response = ErrorResponse::from(error);

        assert_eq!(response.code, "concurrent_modification");
        assert!(!response.detail.contains("0191"));
    }

    #[test]
    fn test_内部エラーは固定detailになる() {
        let response = ErrorResponse::from(CoreError::Internal("secret".to_string()));

        assert_eq!(response, ErrorResponse::internal_error());
    }

    #[test]
    fn test_再試行可能な種別() {
        assert!(ErrorKind::ConcurrentModification.is_retriable());
        assert!(ErrorKind::PersistenceFailure.is_retriable());
        assert!(!ErrorKind::NotEligible.is_retriable());
        assert!(!ErrorKind::WorkflowClosed.is_retriable());
    }
}
