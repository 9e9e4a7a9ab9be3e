/// Route modules

pub mod accounts;
pub mod cfo;
pub mod dashboard;
pub mod govcon;
pub mod health;
pub mod intelligence;
pub mod openapi_routes;
pub mod payroll;
pub mod reports;
pub mod transactions;
pub mod version;

use actix_web::{web, HttpResponse};

use crate::errors::ApiError;
use crate::http::context::{query_config, RequestContext};

async fn not_found(ctx: RequestContext) -> HttpResponse {
    ApiError::NotFound {
        resource: "Route".to_string(),
    }
    .to_response(&ctx.request_id)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(query_config())
        .route("/healthz", web::get().to(health::healthz))
        .route("/readyz", web::get().to(health::readyz))
        .route("/version", web::get().to(version::version))
        .service(
            web::scope("/api-docs")
                .route("/openapi.json", web::get().to(openapi_routes::openapi_json)),
        )
        .service(
            web::scope("/api")
                .route("/accounts", web::get().to(accounts::list_accounts))
                .route("/transactions", web::get().to(transactions::list_transactions))
                .service(
                    web::resource("/payroll/runs")
                        .route(web::get().to(payroll::list_runs))
                        .route(web::post().to(payroll::create_run)),
                )
                .route("/dashboard/metrics", web::get().to(dashboard::metrics))
                .route("/cfo/snapshot", web::get().to(cfo::snapshot))
                .route("/govcon/snapshot", web::get().to(govcon::snapshot))
                .route("/intelligence/insights", web::get().to(intelligence::insights))
                .route("/reports/recurring", web::get().to(reports::recurring))
                .default_service(web::to(not_found)),
        );
}
