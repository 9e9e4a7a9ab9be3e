mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::test;
use finboard_api::app_state::AppState;
use finboard_api::config::ServiceConfig;
use finboard_api::infra::backend::BackendClient;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{account, bearer, days_ago, transaction, FakeLedger, ORG, OTHER_ORG};

fn ledger() -> FakeLedger {
    FakeLedger::default()
        .with_account(ORG, account("acc_1", "Operating"))
        .with_account(OTHER_ORG, account("acc_9", "Globex Payroll"))
        .with_transaction(ORG, transaction("tx_1", days_ago(3), "Coffee Bar #12", None, 4.50))
        .with_transaction(ORG, transaction("tx_2", days_ago(2), "AWS EMEA", Some("Amazon Web Services"), 310.12))
        .with_transaction(ORG, transaction("tx_3", days_ago(1), "Uber *trip", Some("Uber"), 23.10))
        .with_transaction(OTHER_ORG, transaction("tx_x", days_ago(1), "Amazon", Some("Amazon"), 99.0))
}

fn state_with(ledger: FakeLedger) -> AppState {
    AppState::new(ServiceConfig::default()).with_ledger(Some(Arc::new(ledger)))
}

fn get(uri: &str) -> actix_web::test::TestRequest {
    test::TestRequest::get().uri(uri).insert_header(("Authorization", bearer()))
}

#[actix_rt::test]
async fn accounts_are_scoped_to_the_session_org() {
    let app = test_app!(state_with(ledger()));
    let resp = test::call_service(&app, get("/api/accounts").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["acc_1"]);
    assert_eq!(body["data"][0]["type"], "depository");
}

#[actix_rt::test]
async fn accounts_without_database_is_503() {
    let app = test_app!(AppState::new(ServiceConfig::default()));
    let resp = test::call_service(&app, get("/api/accounts").to_request()).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "service_unavailable");
}

#[actix_rt::test]
async fn transaction_search_matches_merchant_name() {
    let app = test_app!(state_with(ledger()));
    let resp = test::call_service(&app, get("/api/transactions?search=amazon").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "tx_2");
    assert_eq!(body["data"]["page"]["has_more"], false);
}

#[actix_rt::test]
async fn transaction_paging_reports_more() {
    let app = test_app!(state_with(ledger()));
    let resp = test::call_service(&app, get("/api/transactions?limit=2").to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    let ids: Vec<&str> = body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["tx_3", "tx_2"]);
    assert_eq!(body["data"]["page"]["has_more"], true);
}

#[actix_rt::test]
async fn transaction_limit_out_of_range() {
    let app = test_app!(state_with(ledger()));
    let resp = test::call_service(&app, get("/api/transactions?limit=501").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(body["data"].is_null());
}

#[actix_rt::test]
async fn malformed_query_uses_the_envelope() {
    let app = test_app!(state_with(ledger()));
    let resp = test::call_service(&app, get("/api/transactions?start_date=yesterday").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let request_id = resp.headers().get("x-request-id").unwrap().to_str().unwrap().to_string();
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "bad_request");
    assert_eq!(body["request_id"], request_id.as_str());
}

#[actix_rt::test]
async fn ledger_failure_is_reported_not_hidden() {
    let app = test_app!(state_with(FakeLedger::broken()));
    let resp = test::call_service(&app, get("/api/transactions").to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"]["code"], "internal");
}

#[actix_rt::test]
async fn recurring_report_finds_monthly_subscription() {
    let mut ledger = ledger();
    for (i, days) in [10, 40, 70, 100, 130, 160].into_iter().enumerate() {
        ledger = ledger.with_transaction(
            ORG,
            transaction(&format!("sub_{}", i), days_ago(days), "NETFLIX.COM 8855", Some("Netflix"), 15.49),
        );
    }
    let app = test_app!(state_with(ledger));
    let resp = test::call_service(&app, get("/api/reports/recurring?lookback_days=365").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;

    assert_eq!(body["data"]["lookback_days"], 365);
    assert_eq!(body["data"]["transactions_analyzed"], 9);
    let series = body["data"]["series"].as_array().unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0]["merchant"], "Netflix");
    assert_eq!(series[0]["frequency"], "monthly");
    assert_eq!(series[0]["occurrences"], 6);
}

#[actix_rt::test]
async fn recurring_lookback_out_of_range() {
    let app = test_app!(state_with(ledger()));
    let resp = test::call_service(&app, get("/api/reports/recurring?lookback_days=7").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn dashboard_marks_failed_sources_as_degraded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/invoices/count"))
        .and(query_param("status", "open"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": 4 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bills/count"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let backend = BackendClient::new(&server.uri(), None, Duration::from_secs(2)).unwrap();
    let app = test_app!(state_with(ledger()).with_backend(Some(backend)));
    let resp = test::call_service(&app, get("/api/dashboard/metrics").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;

    assert_eq!(body["data"]["open_invoices"], 4);
    assert!(body["data"]["unpaid_bills"].is_null());
    assert_eq!(body["data"]["linked_accounts"], 1);
    assert_eq!(body["data"]["degraded"], json!(["unpaid_bills"]));
}

#[actix_rt::test]
async fn request_id_is_fresh_and_echoed() {
    let app = test_app!(state_with(ledger()));
    let mut seen = HashSet::new();
    for _ in 0..3 {
        let req = get("/api/accounts")
            .insert_header(("x-request-id", "client-chosen"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        let header = resp.headers().get("x-request-id").unwrap().to_str().unwrap().to_string();
        let body: Value = test::read_body_json(resp).await;

        assert!(header.starts_with("req_"));
        assert_ne!(header, "client-chosen");
        assert_eq!(body["request_id"], header.as_str());
        seen.insert(header);
    }
    assert_eq!(seen.len(), 3);
}

#[actix_rt::test]
async fn unknown_api_route_is_enveloped_404() {
    let app = test_app!(state_with(ledger()));
    let resp = test::call_service(&app, get("/api/nope").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "not_found");
}

#[actix_rt::test]
async fn pay_run_is_forwarded_to_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payroll/runs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "run_1", "status": "draft" })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = BackendClient::new(&server.uri(), None, Duration::from_secs(2)).unwrap();
    let app = test_app!(state_with(ledger()).with_backend(Some(backend)));
    let req = test::TestRequest::post()
        .uri("/api/payroll/runs")
        .insert_header(("Authorization", bearer()))
        .set_json(json!({
            "pay_period_start": "2025-06-01",
            "pay_period_end": "2025-06-14",
            "pay_date": "2025-06-20"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["id"], "run_1");
}

#[actix_rt::test]
async fn invalid_pay_run_never_reaches_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payroll/runs"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let backend = BackendClient::new(&server.uri(), None, Duration::from_secs(2)).unwrap();
    let app = test_app!(state_with(ledger()).with_backend(Some(backend)));
    let req = test::TestRequest::post()
        .uri("/api/payroll/runs")
        .insert_header(("Authorization", bearer()))
        .set_json(json!({
            "pay_period_start": "2025-06-14",
            "pay_period_end": "2025-06-01",
            "pay_date": "2025-06-20"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["details"]["field"], "pay_period_end");
}
