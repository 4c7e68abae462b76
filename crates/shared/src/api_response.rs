//! # API レスポンスエンベロープ
//!
//! エンジン API の統一レスポンス形式 `{ "data": T }` を提供する。

use serde::{Deserialize, Serialize};

/// 統一レスポンス型
///
/// ```
/// use shoninflow_shared::ApiResponse;
///
/// let response = ApiResponse::new(vec!["pm-1", "dir-1"]);
/// assert_eq!(response.data.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
