use actix_web::{web, App, HttpServer};
use entitlement_service::{
    config::Config, db, error::AppError, handlers, live::fanout, logging, state::AppState,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    logging::init_tracing();
    let cfg = Arc::new(Config::from_env()?);

    let pool = db::init_pool(&cfg.database_url)
        .await
        .map_err(|e| AppError::StartServer(format!("db: {e}")))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| AppError::StartServer(format!("migrations: {e}")))?;

    let redis_client = redis::Client::open(cfg.redis_url.as_str())
        .map_err(|e| AppError::StartServer(format!("redis: {e}")))?;

    let stores = db::Stores::postgres(pool);
    let state = AppState::new(cfg.clone(), stores, Some(redis_client.clone()));

    // Cross-instance fanout: events published by other instances land in
    // this registry; the task resubscribes on transport drop.
    let _fanout_listener = fanout::start_listener(redis_client, state.sessions.clone());

    let bind_addr = format!("0.0.0.0:{}", cfg.port);
    tracing::info!(%bind_addr, "starting entitlement-service");

    let app_state = web::Data::new(state);
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(handlers::configure)
    })
    .bind(&bind_addr)
    .map_err(|e| AppError::StartServer(e.to_string()))?
    .run()
    .await
    .map_err(|e| AppError::StartServer(e.to_string()))
}
