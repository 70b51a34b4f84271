//! Integration tests for user, click, leaderboard and health endpoints.

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

#[path = "../common/mod.rs"]
mod common;
use common::*;

#[tokio::test]
async fn test_health() {
    let app = app(create_test_app_state());

    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_upsert_user_creates_then_refreshes() {
    let state = create_test_app_state();

    let response = app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/user",
            json!({"id": 42, "username": "alice", "first_name": "Alice"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["telegram_id"], 42);
    assert_eq!(json["username"], "alice");
    assert_eq!(json["coins"], 0);

    let response = app(state.clone())
        .oneshot(json_request("POST", "/api/user", json!({"id": 42, "username": "alice2"})))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["username"], "alice2");
    assert_eq!(json["first_name"], "Alice", "missing hints keep stored values");

    let conn = state.db.get().unwrap();
    assert_eq!(queries::count_accounts(&conn).unwrap(), 1);
}

#[tokio::test]
async fn test_upsert_user_requires_id() {
    let state = create_test_app_state();

    let response = app(state.clone())
        .oneshot(json_request("POST", "/api/user", json!({"username": "nobody"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["details"], "Telegram ID is required");

    let conn = state.db.get().unwrap();
    assert_eq!(queries::count_accounts(&conn).unwrap(), 0, "no mutation on validation error");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = app(create_test_app_state());

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/click")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_user() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        create_test_account(&conn, 7, "seven");
    }

    let response = app(state.clone()).oneshot(get_request("/api/user/7")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["username"], "seven");

    let response = app(state).oneshot(get_request("/api/user/8")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["details"], "User not found");
}

#[tokio::test]
async fn test_get_user_non_numeric_id() {
    let app = app(create_test_app_state());
    let response = app.oneshot(get_request("/api/user/abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_click_twice_with_two_coins() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        create_test_account(&conn, 1, "tapper");
    }

    for _ in 0..2 {
        let response = app(state.clone())
            .oneshot(json_request("POST", "/api/click", json!({"telegram_id": 1, "coins": 2})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let conn = state.db.get().unwrap();
    let account = queries::get_account(&conn, 1).unwrap().unwrap();
    assert_eq!(account.coins, 4);
    assert_eq!(account.total_clicks, 2);
}

#[tokio::test]
async fn test_click_defaults_to_one_coin() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        create_test_account(&conn, 1, "tapper");
    }

    let response = app(state.clone())
        .oneshot(json_request("POST", "/api/click", json!({"telegram_id": 1})))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["coins"], 1);
    assert_eq!(json["total_clicks"], 1);

    let response = app(state)
        .oneshot(json_request("POST", "/api/click", json!({"telegram_id": 1, "coins": 0})))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["coins"], 2, "zero is treated as one");
}

#[tokio::test]
async fn test_click_negative_coins_rejected() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        create_test_account(&conn, 1, "tapper");
    }

    let response = app(state.clone())
        .oneshot(json_request("POST", "/api/click", json!({"telegram_id": 1, "coins": -5})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let conn = state.db.get().unwrap();
    assert_eq!(get_coins(&conn, 1), 0);
}

#[tokio::test]
async fn test_click_unknown_account_creates_nothing() {
    let state = create_test_app_state();

    let response = app(state.clone())
        .oneshot(json_request("POST", "/api/click", json!({"telegram_id": 999, "coins": 1})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let conn = state.db.get().unwrap();
    assert!(queries::get_account(&conn, 999).unwrap().is_none());
}

#[tokio::test]
async fn test_leaderboard_order_and_limit() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        for (id, coins) in [(1, 50), (2, 10), (3, 30)] {
            create_test_account(&conn, id, &format!("user{}", id));
            queries::increment_click(&conn, id, coins).unwrap();
        }
    }

    let response = app(state.clone())
        .oneshot(get_request("/api/leaderboard?limit=3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let coins: Vec<i64> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["coins"].as_i64().unwrap())
        .collect();
    assert_eq!(coins, vec![50, 30, 10]);

    let response = app(state.clone())
        .oneshot(get_request("/api/leaderboard?limit=2"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);

    let response = app(state)
        .oneshot(get_request("/api/leaderboard?limit=abc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK, "bad limit falls back to the default");
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_leaderboard_entries_are_public_projection() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        create_test_account(&conn, 1, "player");
    }

    let response = app(state).oneshot(get_request("/api/leaderboard")).await.unwrap();
    let json = body_json(response).await;
    let entry = &json[0];

    assert_eq!(entry["telegram_id"], 1);
    assert!(entry.get("id").is_none());
    assert!(entry.get("created_at").is_none());
}

#[tokio::test]
async fn test_overflowing_click_leaves_leaderboard_working() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        create_test_account(&conn, 1, "steady");
        create_test_account(&conn, 2, "greedy");
    }

    let response = app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/click",
            json!({"telegram_id": 2, "coins": i64::MAX}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app(state.clone())
        .oneshot(json_request("POST", "/api/click", json!({"telegram_id": 2, "coins": 1})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["details"], "Balance would exceed the maximum");

    let response = app(state.clone()).oneshot(get_request("/api/leaderboard")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json[0]["coins"], i64::MAX);
    assert_eq!(json[0]["total_clicks"], 1);

    let response = app(state).oneshot(get_request("/api/user/2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
