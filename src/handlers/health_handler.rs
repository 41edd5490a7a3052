use std::collections::BTreeMap;

use actix_web::{get, web, HttpResponse};

use crate::{
    app_state::AppState,
    models::dto::response::{HealthResponse, IndexResponse},
};

#[get("/health")]
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse { status: "healthy" })
}

#[get("/metrics")]
async fn metrics(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.metrics.export())
}

#[get("/")]
async fn index() -> HttpResponse {
    let endpoints = BTreeMap::from([
        ("POST /api/generate-quiz", "Generate a quiz from a YouTube video"),
        ("GET /api/transcript/{video_id}", "Get the transcript only"),
        ("GET /health", "Health check"),
        ("GET /metrics", "Request counters"),
    ]);

    HttpResponse::Ok().json(IndexResponse {
        message: "YouTube Quiz Generator API",
        endpoints,
    })
}
