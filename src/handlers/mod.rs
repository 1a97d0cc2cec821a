use actix_web::{web, HttpResponse};

pub mod access;
pub mod live;
pub mod live_ws;

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/metrics", web::get().to(crate::metrics::serve_metrics))
        .service(
            web::scope("/api")
                .route(
                    "/content/{content_id}/access",
                    web::get().to(access::content_access),
                )
                .route(
                    "/creators/{creator_id}/subscribe/quote",
                    web::post().to(access::subscription_quote),
                )
                .route(
                    "/purchases/{content_id}/confirm",
                    web::post().to(access::confirm_purchase),
                )
                .route("/streams/go-live", web::post().to(live::go_live))
                .route("/streams/end", web::post().to(live::end_stream))
                .route(
                    "/streams/{creator_id}/leaderboard",
                    web::get().to(live::leaderboard),
                ),
        )
        .route(
            "/ws/streams/{creator_id}",
            web::get().to(live_ws::live_stream_ws),
        );
}
