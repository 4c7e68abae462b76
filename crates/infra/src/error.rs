//! # インフラ層エラー定義
//!
//! 永続化ストアや外部ケイパビリティとのやり取りで発生するエラーを表現する。
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターンを採用:
//! - [`InfraError`]: エラー種別（[`InfraErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`InfraErrorKind`]: エラーの具体的な種別（Conflict, Unavailable 等）
//!
//! `From` 実装や convenience constructor でエラーを生成すると、
//! その時点の呼び出し経路が SpanTrace として記録される。

use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層で発生するエラー
///
/// エラー種別に応じた処理には [`kind()`](InfraError::kind) を使用する:
///
/// ```
/// use shoninflow_infra::{InfraError, InfraErrorKind};
///
/// let error = InfraError::conflict("WorkflowInstance", "wf-1");
/// assert!(matches!(error.kind(), InfraErrorKind::Conflict { .. }));
/// ```
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// 楽観的ロック競合（バージョン不一致、監査連番の不一致、ID 重複）
    #[error("競合が発生しました: {entity}(id={id})")]
    Conflict {
        /// エンティティ名（例: "WorkflowInstance"）
        entity: String,
        /// エンティティの ID
        id:     String,
    },

    /// ストアが利用できない
    #[error("ストアが利用できません: {0}")]
    Unavailable(String),

    /// 保存済みデータや設定ファイルが不正
    #[error("不正なデータ: {0}")]
    InvalidData(String),

    /// シリアライズ/デシリアライズエラー
    #[error("シリアライズエラー: {0}")]
    Serialization(#[source] serde_json::Error),

    /// ファイル I/O エラー
    #[error("I/O エラー: {0}")]
    Io(#[source] std::io::Error),

    /// 予期しないエラー
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

impl InfraError {
    /// エラー種別を取得する
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    /// SpanTrace を取得する
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// Conflict バリアントの場合、entity と id を返す
    pub fn as_conflict(&self) -> Option<(&str, &str)> {
        match &self.kind {
            InfraErrorKind::Conflict { entity, id } => Some((entity, id)),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self.kind, InfraErrorKind::Conflict { .. })
    }

    fn with_kind(kind: InfraErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }

    // ===== Convenience constructors =====

    /// 楽観的ロック競合エラーを生成する
    pub fn conflict(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::Conflict {
            entity: entity.into(),
            id:     id.into(),
        })
    }

    /// ストア利用不可エラーを生成する
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::Unavailable(msg.into()))
    }

    /// 不正データエラーを生成する
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::InvalidData(msg.into()))
    }

    /// 予期しないエラーを生成する
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::Unexpected(msg.into()))
    }
}

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

// ===== From 実装（SpanTrace 自動キャプチャ） =====

impl From<serde_json::Error> for InfraError {
    fn from(source: serde_json::Error) -> Self {
        Self::with_kind(InfraErrorKind::Serialization(source))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(source: std::io::Error) -> Self {
        Self::with_kind(InfraErrorKind::Io(source))
    }
}

impl From<shoninflow_domain::DomainError> for InfraError {
    fn from(source: shoninflow_domain::DomainError) -> Self {
        Self::invalid_data(source.to_string())
    }
}
