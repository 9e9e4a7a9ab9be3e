use actix_web::{HttpResponse, Responder};

pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(crate::openapi::generate_openapi_spec())
}
