//! ユースケース層の共通ヘルパー
//!
//! リポジトリ呼び出し結果の変換など、
//! 複数のユースケースで繰り返されるパターンを共通化する。

use shoninflow_infra::{InfraError, InfraErrorKind};

use crate::error::CoreError;

/// リポジトリの `Result<Option<T>, InfraError>` を `Result<T, CoreError>` に変換する
///
/// `find_by_id` 等の `Option` を返すリポジトリメソッドの結果を、
/// `CoreError::NotFound` または `CoreError::PersistenceFailure` に変換する。
///
/// ```ignore
/// let instance = self.deps.instance_repo.find_by_id(&id).await
///     .or_not_found("ワークフロー")?;
/// ```
pub(crate) trait FindResultExt<T> {
    /// `None` の場合は `CoreError::NotFound`、`InfraError` の場合は
    /// `CoreError::PersistenceFailure` を返す
    fn or_not_found(self, entity_name: &str) -> Result<T, CoreError>;
}

impl<T> FindResultExt<T> for Result<Option<T>, InfraError> {
    fn or_not_found(self, entity_name: &str) -> Result<T, CoreError> {
        self.map_err(CoreError::PersistenceFailure)?
            .ok_or_else(|| CoreError::NotFound(format!("{}が見つかりません", entity_name)))
    }
}

/// 書き込み時の InfraError を CoreError に変換する
///
/// 競合（バージョン不一致・連番不一致・ID 重複）は再試行可能な
/// `ConcurrentModification`、それ以外は `PersistenceFailure` になる。
pub(crate) fn write_error(e: InfraError) -> CoreError {
    match e.kind() {
        InfraErrorKind::Conflict { .. } => CoreError::ConcurrentModification(e.to_string()),
        _ => CoreError::PersistenceFailure(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    // === FindResultExt ===

    #[test]
    fn test_or_not_found_ok_some_は値を返す() {
        let result: Result<Option<i32>, InfraError> = Ok(Some(42));

        let value = result.or_not_found("テスト").unwrap();

        assert_eq!(value, 42);
    }

    #[test]
    fn test_or_not_found_ok_none_はnotfoundエラーを返す() {
        let result: Result<Option<i32>, InfraError> = Ok(None);

        let err = result.or_not_found("ワークフロー").unwrap_err();

        assert!(matches!(err, CoreError::NotFound(ref msg) if msg == "ワークフローが見つかりません"));
    }

    #[test]
    fn test_or_not_found_err_は永続化エラーを返す() {
        let result: Result<Option<i32>, InfraError> = Err(InfraError::unavailable("down"));

        let err = result.or_not_found("ワークフロー").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PersistenceFailure);
    }

    // === write_error ===

    #[test]
    fn test_write_error_競合は並行更新エラーになる() {
        let err = write_error(InfraError::conflict("WorkflowInstance", "wf-1"));

        assert_eq!(err.kind(), ErrorKind::ConcurrentModification);
    }

    #[test]
    fn test_write_error_その他は永続化エラーになる() {
        let err = write_error(InfraError::unexpected("poisoned"));

        assert_eq!(err.kind(), ErrorKind::PersistenceFailure);
    }
}
