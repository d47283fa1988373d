pub mod insights;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(insights::json_config())
        .route("/health", web::get().to(insights::health))
        .route(
            "/api/ai-insights",
            web::post().to(insights::generate_insights),
        );
}
