//! Additional integration tests for specific request flows.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use web3_payroll_api::api::{RateLimitConfig, create_router, create_router_with_rate_limit};
use web3_payroll_api::app::AppState;
use web3_payroll_api::domain::{
    Employee, PaginatedResponse, PaymentRecord, PayrollRunResult, TokenAmount,
};
use web3_payroll_api::infra::{InMemoryBonusStore, SimulatedChainClient};
use web3_payroll_api::test_utils::{MockDatabaseClient, MockEnsProvider};

const ALICE: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
const BOB: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

fn create_test_state() -> Arc<AppState> {
    let db = Arc::new(MockDatabaseClient::new());
    let chain = Arc::new(
        SimulatedChainClient::new(
            &["USDC"][..],
            &[("USDC".to_string(), TokenAmount::from_whole(50_000))],
        )
        .unwrap(),
    );
    let ens = Arc::new(MockEnsProvider::new());
    Arc::new(AppState::new(
        db as _,
        chain as _,
        ens as _,
        Arc::new(InMemoryBonusStore::new()) as _,
    ))
}

fn employee_body(wallet: &str, email: &str) -> String {
    json!({
        "first_name": "Alice",
        "last_name": "Nakamoto",
        "email": email,
        "department": "Engineering",
        "position": "Protocol Engineer",
        "start_date": "2026-01-15",
        "wallet_address": wallet,
        "salary": "2500",
        "preferred_token": "USDC"
    })
    .to_string()
}

fn json_request(method: &str, uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body_bytes).unwrap()
}

async fn create_employee(router: &Router, wallet: &str, email: &str) -> Employee {
    let response = router
        .clone()
        .oneshot(json_request("POST", "/api/employees", employee_body(wallet, email)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

#[tokio::test]
async fn test_full_employee_lifecycle_flow() {
    let router = create_router(create_test_state());

    // 1. POST - create the employee
    let created = create_employee(&router, ALICE, "alice@acme.xyz").await;
    assert_eq!(created.wallet_address, ALICE);

    // 2. GET - retrieve by wallet, lowercase input is accepted
    let response = router
        .clone()
        .oneshot(empty_request(
            "GET",
            &format!("/api/employees/wallet/{}", ALICE.to_lowercase()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let by_wallet: Employee = read_json(response).await;
    assert_eq!(by_wallet.id, created.id);

    // 3. GET - list and verify the new employee is present
    let response = router
        .clone()
        .oneshot(empty_request("GET", "/api/employees?limit=10"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let list: PaginatedResponse<Employee> = read_json(response).await;
    assert!(list.items.iter().any(|e| e.id == created.id));

    // 4. DELETE - then the employee is gone
    let response = router
        .clone()
        .oneshot(empty_request("DELETE", &format!("/api/employees/{}", created.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .clone()
        .oneshot(empty_request("GET", &format!("/api/employees/{}", created.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wallet_change_moves_payroll_to_new_wallet() {
    let router = create_router(create_test_state());
    let created = create_employee(&router, ALICE, "alice@acme.xyz").await;

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/employees/{}", created.id),
            json!({ "wallet_address": BOB.to_lowercase() }).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Employee = read_json(response).await;
    assert_eq!(updated.wallet_address, BOB);

    let response = router
        .clone()
        .oneshot(json_request("POST", "/api/payroll/process", "{}".to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let run: PayrollRunResult = read_json(response).await;
    assert_eq!(run.processed.len(), 1);
    assert_eq!(run.processed[0].wallet_address, BOB);

    let response = router
        .clone()
        .oneshot(empty_request("GET", "/api/payroll/history"))
        .await
        .unwrap();
    let history: PaginatedResponse<PaymentRecord> = read_json(response).await;
    assert_eq!(history.items[0].wallet_address, BOB);
}

#[tokio::test]
async fn test_deactivation_is_idempotent_and_excludes_from_payroll() {
    let router = create_router(create_test_state());
    let created = create_employee(&router, ALICE, "alice@acme.xyz").await;
    let deactivate = format!("/api/employees/{}/deactivate", created.id);

    for _ in 0..2 {
        let response = router
            .clone()
            .oneshot(empty_request("PATCH", &deactivate))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let employee: Employee = read_json(response).await;
        assert!(!employee.is_active);
    }

    let response = router
        .clone()
        .oneshot(json_request("POST", "/api/payroll/process", "{}".to_string()))
        .await
        .unwrap();
    let run: PayrollRunResult = read_json(response).await;
    assert!(run.processed.is_empty());

    let response = router
        .clone()
        .oneshot(empty_request(
            "PATCH",
            &format!("/api/employees/{}/activate", created.id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let employee: Employee = read_json(response).await;
    assert!(employee.is_active);

    let response = router
        .clone()
        .oneshot(json_request("POST", "/api/payroll/process", "{}".to_string()))
        .await
        .unwrap();
    let run: PayrollRunResult = read_json(response).await;
    assert_eq!(run.processed.len(), 1);
}

#[tokio::test]
async fn test_post_bad_request_validation() {
    let router = create_router(create_test_state());

    // Truncated address
    let bad_wallet = "0x5aAeb6053F3E94C9b9A09f33669435";
    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/employees",
            employee_body(bad_wallet, "alice@acme.xyz"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_json(response).await;
    assert_eq!(body["error"]["type"], "validation_error");

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/employees",
            employee_body(ALICE, "not-an-email"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let router = create_router(create_test_state());

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/employees",
            "{\"first_name\": ".to_string(),
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let router = create_router(create_test_state());

    let padding = "x".repeat(1024 * 1024);
    let body = json!({ "first_name": padding }).to_string();
    let response = router
        .clone()
        .oneshot(json_request("POST", "/api/employees", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    // A regular body still goes through the same stack
    create_employee(&router, ALICE, "alice@acme.xyz").await;
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let router = create_router(create_test_state());

    let response = router
        .oneshot(empty_request("GET", "/api-docs/openapi.json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let doc: Value = read_json(response).await;
    let paths = doc["paths"].as_object().unwrap();
    assert!(paths.contains_key("/api/employees"));
    assert!(paths.contains_key("/api/payroll/process"));
    assert!(paths.contains_key("/api/ens/check/{name}"));
    assert!(paths.contains_key("/api/admin/pause"));
}

#[tokio::test]
async fn test_rate_limit_applies_to_api_only() {
    let router = create_router_with_rate_limit(
        create_test_state(),
        RateLimitConfig {
            requests_per_second: 1,
            burst_size: 1,
        },
    );

    let first = router
        .clone()
        .oneshot(empty_request("GET", "/api/employees"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = router
        .clone()
        .oneshot(empty_request("GET", "/api/employees"))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(second.headers().get(header::RETRY_AFTER).unwrap(), "1");
    let body: Value = read_json(second).await;
    assert_eq!(body["error"]["type"], "rate_limited");

    // Health probes are never throttled
    let health = router
        .clone()
        .oneshot(empty_request("GET", "/health/live"))
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}
