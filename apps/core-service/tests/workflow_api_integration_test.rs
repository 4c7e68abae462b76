//! ワークフロー API 統合テスト
//!
//! Router を通じて HTTP 経由の操作を検証する。
//!
//! ## テストケース
//!
//! - ヘルスチェック
//! - 作成 → 取得 → アクション → 履歴でレスポンスが一致
//! - エラーは RFC 9457 形式で安定コードを返す
//! - テンプレートからの作成と一覧
//! - 承認待ち一覧の絞り込み

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use chrono::Duration;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value as JsonValue, json};
use shoninflow_core_service::{
    app_builder,
    handler::WorkflowState,
    test_utils::{WorkflowTestBuilder, WorkflowTestSetup},
};
use shoninflow_domain::{
    value_objects::ApproverId,
    workflow::{RoutingStrategy, WorkflowTemplate, WorkflowTemplateId},
};
use tower::ServiceExt;
use uuid::Uuid;

// --- テストヘルパー ---

fn create_test_app(builder: &WorkflowTestBuilder) -> (Router, WorkflowTestSetup) {
    let setup = builder.build();
    let state = Arc::new(WorkflowState {
        usecase: Arc::clone(&setup.sut),
    });
    (app_builder::router(state), setup)
}

fn purchase_template() -> WorkflowTemplate {
    WorkflowTemplate {
        id:                WorkflowTemplateId::new(),
        document_type:     "purchase_request".to_string(),
        name:              "購買申請".to_string(),
        default_strategy:  RoutingStrategy::Sequential,
        default_approvers: vec![
            ApproverId::new("manager-1").unwrap(),
            ApproverId::new("finance-1").unwrap(),
        ],
        sla_days:          Some(3),
    }
}

/// レスポンスボディを JSON として解析する
async fn parse_body(response: axum::http::Response<Body>) -> JsonValue {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, parse_body(response).await)
}

async fn create_via_api(app: &Router, body: JsonValue) -> JsonValue {
    let (status, json) = send(app, Method::POST, "/internal/workflows", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "作成に失敗: {json}");
    json["data"].clone()
}

fn sequential_body() -> JsonValue {
    json!({
        "document_ref": "contract-42@v3",
        "project_ref": "proj-a",
        "strategy": "sequential",
        "required_approvers": ["pm-1", "dir-1"],
        "priority": 3
    })
}

async fn act(app: &Router, id: &str, body: JsonValue) -> (StatusCode, JsonValue) {
    send(
        app,
        Method::POST,
        &format!("/internal/workflows/{id}/actions"),
        Some(body),
    )
    .await
}

// --- テストケース ---

#[tokio::test]
async fn test_ヘルスチェックはhealthyを返す() {
    let (app, _setup) = create_test_app(&WorkflowTestBuilder::new());

    let (status, json) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_作成したワークフローを取得できる() {
    // Given
    let (app, _setup) = create_test_app(&WorkflowTestBuilder::new());
    let created = create_via_api(&app, sequential_body()).await;
    let id = created["id"].as_str().unwrap();

    // When
    let (status, json) = send(&app, Method::GET, &format!("/internal/workflows/{id}"), None).await;

    // Then
    assert_eq!(status, StatusCode::OK);
    let data = &json["data"];
    assert_eq!(data["document_ref"], "contract-42@v3");
    assert_eq!(data["project_ref"], "proj-a");
    assert_eq!(data["strategy"], "sequential");
    assert_eq!(data["status"], "pending");
    assert_eq!(data["priority"], 3);
    assert_eq!(data["version"], 1);
    assert_eq!(data["eligible_approvers"], json!(["pm-1"]));
    assert_eq!(data["document_attributes"], json!({}));
}

#[tokio::test]
async fn test_アクションの結果と履歴が一致する() {
    // Given
    let (app, _setup) = create_test_app(&WorkflowTestBuilder::new());
    let created = create_via_api(&app, sequential_body()).await;
    let id = created["id"].as_str().unwrap();

    // When
    let (comment_status, _) = act(
        &app,
        id,
        json!({"actor_id": "pm-1", "action_type": "comment", "comment": "第 3 条を確認しました"}),
    )
    .await;
    let (approve_status, approved) =
        act(&app, id, json!({"actor_id": "pm-1", "action_type": "approve"})).await;
    let (_, history) = send(
        &app,
        Method::GET,
        &format!("/internal/workflows/{id}/history"),
        None,
    )
    .await;
    let (_, eligible) = send(
        &app,
        Method::GET,
        &format!("/internal/workflows/{id}/eligible-approvers"),
        None,
    )
    .await;

    // Then
    assert_eq!(comment_status, StatusCode::OK);
    assert_eq!(approve_status, StatusCode::OK);
    assert_eq!(approved["data"]["workflow"]["status"], "in_review");
    assert_eq!(approved["data"]["audit_entry"]["sequence"], 2);
    assert_eq!(
        approved["data"]["events"],
        json!(["step_approved", "approval_requested"])
    );

    let entries = history["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["action_type"], "comment");
    assert_eq!(entries[0]["comment"], "第 3 条を確認しました");
    assert_eq!(entries[1]["action_type"], "approve");
    assert_eq!(entries[1]["actor_id"], "pm-1");

    assert_eq!(eligible["data"], json!(["dir-1"]));
}

#[rstest]
#[case::順番でない承認者(json!({"actor_id": "dir-1", "action_type": "approve"}), 403, "not_eligible")]
#[case::理由なしの却下(json!({"actor_id": "pm-1", "action_type": "reject"}), 400, "missing_rejection_reason")]
#[case::委任先なしの委任(json!({"actor_id": "pm-1", "action_type": "delegate"}), 400, "invalid_delegate")]
#[case::承認での委任先指定(json!({"actor_id": "pm-1", "action_type": "approve", "delegate_to": "x-1"}), 400, "invalid_delegate")]
#[case::未知のアクション種別(json!({"actor_id": "pm-1", "action_type": "escalate"}), 400, "bad_request")]
#[case::空のアクター(json!({"actor_id": "  ", "action_type": "approve"}), 400, "bad_request")]
#[tokio::test]
async fn test_拒否されたアクションはproblem_detailsを返す(
    #[case] body: JsonValue,
    #[case] expected_status: u16,
    #[case] expected_code: &str,
) {
    // Given
    let (app, _setup) = create_test_app(&WorkflowTestBuilder::new());
    let created = create_via_api(&app, sequential_body()).await;
    let id = created["id"].as_str().unwrap();

    // When
    let (status, json) = act(&app, id, body).await;

    // Then
    assert_eq!(status.as_u16(), expected_status);
    assert_eq!(json["code"], expected_code);
    assert_eq!(json["status"], expected_status);
    assert_eq!(
        json["type"],
        format!(
            "https://shoninflow.example.com/errors/{}",
            expected_code.replace('_', "-")
        )
    );
    assert!(json["title"].is_string());
    assert!(json["detail"].is_string());
}

#[tokio::test]
async fn test_終了したワークフローへのアクションは409() {
    // Given
    let (app, _setup) = create_test_app(&WorkflowTestBuilder::new());
    let created = create_via_api(&app, sequential_body()).await;
    let id = created["id"].as_str().unwrap();
    act(
        &app,
        id,
        json!({"actor_id": "pm-1", "action_type": "reject", "comment": "差し戻し"}),
    )
    .await;

    // When
    let (status, json) = act(&app, id, json!({"actor_id": "dir-1", "action_type": "approve"})).await;

    // Then
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "workflow_closed");
}

#[tokio::test]
async fn test_存在しないワークフローは404() {
    let (app, _setup) = create_test_app(&WorkflowTestBuilder::new());
    let id = Uuid::now_v7();

    let (get_status, get_json) =
        send(&app, Method::GET, &format!("/internal/workflows/{id}"), None).await;
    let (history_status, _) = send(
        &app,
        Method::GET,
        &format!("/internal/workflows/{id}/history"),
        None,
    )
    .await;
    let (act_status, _) = act(
        &app,
        &id.to_string(),
        json!({"actor_id": "pm-1", "action_type": "approve"}),
    )
    .await;

    assert_eq!(get_status, StatusCode::NOT_FOUND);
    assert_eq!(get_json["code"], "not_found");
    assert_eq!(history_status, StatusCode::NOT_FOUND);
    assert_eq!(act_status, StatusCode::NOT_FOUND);
}

#[rstest]
#[case::承認者なし(json!({"document_ref": "d@v1", "strategy": "parallel", "required_approvers": [], "priority": 2}))]
#[case::承認者の重複(json!({"document_ref": "d@v1", "strategy": "parallel", "required_approvers": ["a", "a"], "priority": 2}))]
#[case::範囲外の優先度(json!({"document_ref": "d@v1", "strategy": "parallel", "required_approvers": ["a"], "priority": 9}))]
#[case::未知の戦略(json!({"document_ref": "d@v1", "strategy": "round_robin", "required_approvers": ["a"], "priority": 2}))]
#[case::逐次での条件ルール(json!({
    "document_ref": "d@v1",
    "strategy": "sequential",
    "conditional_rules": [{"attribute": "amount", "operator": "gt", "value": 1, "approvers": ["a"]}],
    "required_approvers": ["a"],
    "priority": 2
}))]
#[case::必須承認者にいないルール承認者(json!({
    "document_ref": "d@v1",
    "strategy": "conditional",
    "conditional_rules": [{"attribute": "amount", "operator": "gt", "value": 1, "approvers": ["z"]}],
    "required_approvers": ["a"],
    "priority": 2
}))]
#[tokio::test]
async fn test_不正な作成リクエストは400(#[case] body: JsonValue) {
    let (app, _setup) = create_test_app(&WorkflowTestBuilder::new());

    let (status, json) = send(&app, Method::POST, "/internal/workflows", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "bad_request");
}

#[tokio::test]
async fn test_テンプレートからワークフローを作成できる() {
    // Given
    let builder = WorkflowTestBuilder::new().with_templates(vec![purchase_template()]);
    let (app, _setup) = create_test_app(&builder);

    // When
    let (status, json) = send(
        &app,
        Method::POST,
        "/internal/workflows/from-template",
        Some(json!({
            "document_type": "purchase_request",
            "document_ref": "po-7@v1",
            "priority": 2
        })),
    )
    .await;
    let (_, templates) = send(&app, Method::GET, "/internal/workflow-templates", None).await;

    // Then
    assert_eq!(status, StatusCode::CREATED);
    let data = &json["data"];
    assert_eq!(data["required_approvers"], json!(["manager-1", "finance-1"]));
    assert_eq!(
        data["estimated_completion_at"],
        (builder.now() + Duration::days(3)).to_rfc3339()
    );

    let list = templates["data"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["document_type"], "purchase_request");
    assert_eq!(list[0]["default_strategy"], "sequential");
    assert_eq!(list[0]["sla_days"], 3);
}

#[tokio::test]
async fn test_未登録のドキュメント種別は404() {
    let (app, _setup) = create_test_app(&WorkflowTestBuilder::new());

    let (status, json) = send(
        &app,
        Method::POST,
        "/internal/workflows/from-template",
        Some(json!({
            "document_type": "unknown",
            "document_ref": "x@v1",
            "priority": 2
        })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "not_found");
}

#[tokio::test]
async fn test_承認待ち一覧を承認者とプロジェクトで絞り込める() {
    // Given
    let (app, _setup) = create_test_app(&WorkflowTestBuilder::new());
    let mine = create_via_api(&app, sequential_body()).await;
    create_via_api(
        &app,
        json!({
            "document_ref": "other@v1",
            "project_ref": "proj-b",
            "strategy": "parallel",
            "required_approvers": ["pm-1"],
            "priority": 4
        }),
    )
    .await;
    create_via_api(
        &app,
        json!({
            "document_ref": "not-mine@v1",
            "project_ref": "proj-a",
            "strategy": "parallel",
            "required_approvers": ["ceo-1"],
            "priority": 1
        }),
    )
    .await;

    // When
    let (all_status, all) = send(&app, Method::GET, "/internal/approvals/pending", None).await;
    let (_, filtered) = send(
        &app,
        Method::GET,
        "/internal/approvals/pending?approver_id=pm-1&project_ref=proj-a",
        None,
    )
    .await;

    // Then
    assert_eq!(all_status, StatusCode::OK);
    let all = all["data"].as_array().unwrap();
    assert_eq!(all.len(), 3);
    // Urgent が先頭、次に優先度の高い順
    assert_eq!(all[0]["workflow"]["priority"], 4);
    assert_eq!(all[1]["workflow"]["priority"], 3);
    assert_eq!(all[2]["workflow"]["priority"], 1);

    let filtered = filtered["data"].as_array().unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["workflow"]["id"], mine["id"]);
    assert_eq!(filtered[0]["age_in_days"], 0);
    assert_eq!(filtered[0]["is_overdue"], false);
}
