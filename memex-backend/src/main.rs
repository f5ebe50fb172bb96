use actix_cors::Cors;
use actix_files::Files;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

use memex_backend::config::Config;
use memex_backend::controllers::{health, tools as tools_api};
use memex_backend::kb::{GitDocumentSource, KnowledgeBase};
use memex_backend::tools;
use memex_backend::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();
    log::info!(
        "[SERVER] Knowledge root: {} (auto-pull: {})",
        config.knowledge_root.display(),
        config.auto_pull
    );

    let source = GitDocumentSource::new(config.knowledge_root.clone());
    let kb = KnowledgeBase::open(Box::new(source), config.auto_pull).await?;

    let state = web::Data::new(AppState {
        kb: Arc::new(kb),
        registry: Arc::new(tools::default_registry()),
        config: config.clone(),
    });

    let viewer_dir = config.viewer_dir();
    let port = config.port;
    log::info!("[SERVER] Listening on port {}", port);

    HttpServer::new(move || {
        let mut app = App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .configure(health::config_routes)
            .configure(tools_api::config_routes);

        // built viewer snapshot, when present
        if viewer_dir.exists() {
            app = app.service(Files::new("/", &viewer_dir).index_file("index.html"));
        }
        app
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
