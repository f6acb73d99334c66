use actix_web::{get, web, HttpResponse};
use serde::Serialize;

use crate::{config::RelayConfig, error::Result};

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub upstream_timeout_secs: u64,
}

#[get("/health")]
pub async fn health_check(config: web::Data<RelayConfig>) -> Result<HttpResponse> {
    let response = HealthCheckResponse {
        status: "healthy".to_string(),
        upstream_timeout_secs: config.upstream.timeout_secs,
    };

    Ok(HttpResponse::Ok().json(response))
}
