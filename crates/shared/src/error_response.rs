//! # エラーレスポンス（RFC 9457 Problem Details）
//!
//! 全エンドポイントで共通のエラーレスポンス構造体を提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換はサービス側の責務（shared に axum 依存を入れない）
//! - `code` は列挙可能な安定コード（例: `not_eligible`）。`type` URI は
//!   コードのケバブケースから生成する

use serde::{Deserialize, Serialize};

/// error_type URI のベースパス
const ERROR_TYPE_BASE: &str = "https://shoninflow.example.com/errors";

/// エラーレスポンス（RFC 9457 Problem Details + 安定コード）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title:      String,
    pub status:     u16,
    pub detail:     String,
    pub code:       String,
}

impl ErrorResponse {
    /// 汎用コンストラクタ
    ///
    /// `code` は snake_case の安定コード。`type` URI にはハイフン区切りに
    /// 変換したものが付加される（`not_eligible` → `.../errors/not-eligible`）。
    pub fn new(
        code: &str,
        title: impl Into<String>,
        status: u16,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            error_type: format!("{ERROR_TYPE_BASE}/{}", code.replace('_', "-")),
            title: title.into(),
            status,
            detail: detail.into(),
            code: code.to_string(),
        }
    }

    /// 400 Bad Request
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new("bad_request", "Bad Request", 400, detail)
    }

    /// 403 Forbidden
    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new("forbidden", "Forbidden", 403, detail)
    }

    /// 404 Not Found
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new("not_found", "Not Found", 404, detail)
    }

    /// 500 Internal Server Error
    ///
    /// detail は固定値（内部情報を漏らさないため）。
    pub fn internal_error() -> Self {
        Self::new(
            "internal",
            "Internal Server Error",
            500,
            "内部エラーが発生しました",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_でコードからtype_uriが生成される() {
        let error = ErrorResponse::new("not_eligible", "Not Eligible", 403, "承認順序ではありません");

        assert_eq!(
            error.error_type,
            "https://shoninflow.example.com/errors/not-eligible"
        );
        assert_eq!(error.code, "not_eligible");
        assert_eq!(error.title, "Not Eligible");
        assert_eq!(error.status, 403);
        assert_eq!(error.detail, "承認順序ではありません");
    }

    #[test]
    fn test_internal_error_が500と固定detailを返す() {
        let error = ErrorResponse::internal_error();

        assert_eq!(error.status, 500);
        assert_eq!(error.code, "internal");
        assert_eq!(error.detail, "内部エラーが発生しました");
    }

    #[test]
    fn test_jsonシリアライズでtypeフィールド名が正しい() {
        let error = ErrorResponse::bad_request("不正なリクエスト");
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(
            json["type"],
            "https://shoninflow.example.com/errors/bad-request"
        );
        assert_eq!(json["code"], "bad_request");
        assert_eq!(json["status"], 400);
        assert!(json.get("error_type").is_none());
    }

    #[test]
    fn test_便利コンストラクタのstatusが正しい() {
        assert_eq!(ErrorResponse::bad_request("").status, 400);
        assert_eq!(ErrorResponse::forbidden("").status, 403);
        assert_eq!(ErrorResponse::not_found("").status, 404);
        assert_eq!(ErrorResponse::internal_error().status, 500);
    }
}
