//! Tool invocation API — the remote caller surface.
//!
//! GET lists tool definitions; POST executes one by name. Execution
//! results always come back 200 with `success` inside the body; HTTP
//! errors are reserved for unknown tools and bad requests.

use actix_web::{web, HttpResponse, Responder};
use serde_json::Value;

use crate::tools::ToolContext;
use crate::AppState;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/tools").route(web::get().to(list_tools)));
    cfg.service(web::resource("/api/tools/{name}").route(web::post().to(execute_tool)));
}

async fn list_tools(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "tools": state.registry.definitions(),
    }))
}

async fn execute_tool(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: Option<web::Json<Value>>,
) -> impl Responder {
    let name = path.into_inner();
    if state.registry.get(&name).is_none() {
        return HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("Unknown tool: {}", name)
        }));
    }

    let params = params
        .map(|p| p.into_inner())
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));

    let context = ToolContext {
        kb: state.kb.clone(),
        config: state.config.clone(),
    };
    let result = state.registry.execute(&name, params, &context).await;
    HttpResponse::Ok().json(result)
}
