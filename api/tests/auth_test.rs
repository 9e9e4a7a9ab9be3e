mod common;

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::test;
use chrono::Utc;
use finboard_api::app_state::AppState;
use finboard_api::config::{AuthConfig, ServiceConfig};
use serde_json::Value;

use common::{account, bearer, claims, token_for, FakeLedger, ORG};

fn state() -> AppState {
    let ledger = FakeLedger::default().with_account(ORG, account("acc_1", "Operating"));
    AppState::new(ServiceConfig::default()).with_ledger(Some(Arc::new(ledger)))
}

async fn error_reason<B: MessageBody>(resp: ServiceResponse<B>) -> (String, Option<String>) {
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["ok"], false);
    (
        body["error"]["code"].as_str().unwrap_or_default().to_string(),
        body["error"]["details"]["reason"].as_str().map(str::to_string),
    )
}

#[actix_rt::test]
async fn missing_token_is_rejected() {
    let app = test_app!(state());
    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/accounts").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let (code, reason) = error_reason(resp).await;
    assert_eq!(code, "unauthorized");
    assert_eq!(reason.as_deref(), Some("token_missing"));
}

#[actix_rt::test]
async fn expired_token_is_rejected() {
    let app = test_app!(state());
    let mut expired = claims(Some(ORG), true);
    expired.iat -= 7200;
    expired.exp = Utc::now().timestamp() - 600;
    let req = test::TestRequest::get()
        .uri("/api/accounts")
        .insert_header(("Authorization", format!("Bearer {}", token_for(&expired))))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let (_, reason) = error_reason(resp).await;
    assert_eq!(reason.as_deref(), Some("token_expired"));
}

#[actix_rt::test]
async fn tampered_token_is_rejected() {
    let app = test_app!(state());
    let token = token_for(&claims(Some(ORG), true));
    let mut parts: Vec<&str> = token.split('.').collect();
    let forged_payload = token_for(&claims(Some("org_someone_else"), true));
    let forged: Vec<&str> = forged_payload.split('.').collect();
    parts[1] = forged[1];
    let req = test::TestRequest::get()
        .uri("/api/accounts")
        .insert_header(("Authorization", format!("Bearer {}", parts.join("."))))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let (_, reason) = error_reason(resp).await;
    assert_eq!(reason.as_deref(), Some("token_invalid"));
}

#[actix_rt::test]
async fn health_and_docs_are_open() {
    let app = test_app!(state());
    for uri in ["/healthz", "/version", "/api-docs/openapi.json"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
    }
}

#[actix_rt::test]
async fn valid_bearer_token_reaches_handler() {
    let app = test_app!(state());
    let req = test::TestRequest::get()
        .uri("/api/accounts")
        .insert_header(("Authorization", bearer()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["data"][0]["id"], "acc_1");
}

#[actix_rt::test]
async fn session_cookie_is_accepted() {
    let app = test_app!(state());
    let token = token_for(&claims(Some(ORG), false));
    let req = test::TestRequest::get()
        .uri("/api/accounts")
        .insert_header(("Cookie", format!("theme=dark; __session={}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn payroll_requires_second_factor() {
    let app = test_app!(state());
    let token = token_for(&claims(Some(ORG), false));
    let req = test::TestRequest::get()
        .uri("/api/payroll/runs")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let (code, reason) = error_reason(resp).await;
    assert_eq!(code, "forbidden");
    assert_eq!(reason.as_deref(), Some("mfa_required"));
}

#[actix_rt::test]
async fn session_without_organization_is_forbidden() {
    let app = test_app!(state());
    let token = token_for(&claims(None, true));
    let req = test::TestRequest::get()
        .uri("/api/accounts")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let (_, reason) = error_reason(resp).await;
    assert_eq!(reason.as_deref(), Some("no_active_organization"));
}

#[actix_rt::test]
async fn disabled_auth_uses_dev_identity() {
    let auth = AuthConfig {
        enabled: false,
        dev_org_id: Some(ORG.to_string()),
        ..AuthConfig::default()
    };
    let app = test_app!(state(), auth);
    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/accounts").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

#[actix_rt::test]
async fn encoded_payroll_path_still_requires_second_factor() {
    let app = test_app!(state());
    let token = token_for(&claims(Some(ORG), false));
    for uri in ["/api/%70ayroll/runs", "/api/payro%6Cl/runs"] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{}", uri);
        let (_, reason) = error_reason(resp).await;
        assert_eq!(reason.as_deref(), Some("mfa_required"), "{}", uri);
    }
}
