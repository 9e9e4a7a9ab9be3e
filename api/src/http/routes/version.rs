/// Version route

use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use crate::app_state::AppState;

#[derive(Serialize)]
struct VersionResponse<'a> {
    name: &'a str,
    version: &'a str,
    build: &'static str,
}

pub async fn version(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(VersionResponse {
        name: &state.service_config.name,
        version: &state.service_config.version,
        build: env!("CARGO_PKG_VERSION"),
    })
}
