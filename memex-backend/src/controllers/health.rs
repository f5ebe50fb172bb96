use actix_web::{web, HttpResponse, Responder};

use crate::AppState;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health").route(web::get().to(health_check)));
    cfg.service(web::resource("/api/version").route(web::get().to(get_version)));
    cfg.service(web::resource("/api/stats").route(web::get().to(get_stats)));
}

async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": VERSION,
        "entries": state.kb.entry_count(),
    }))
}

async fn get_version() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "version": VERSION
    }))
}

/// Corpus-wide statistics from the current snapshot
async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    state.kb.ensure_fresh().await;

    let by_type: std::collections::HashMap<String, usize> = state
        .kb
        .type_counts()
        .into_iter()
        .map(|(t, c)| (t.as_ref().to_string(), c))
        .collect();

    HttpResponse::Ok().json(serde_json::json!({
        "entries": state.kb.entry_count(),
        "edges": state.kb.edge_count(),
        "by_type": by_type,
        "by_tag": state.kb.tag_counts(),
    }))
}
