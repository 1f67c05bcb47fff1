// src/main.rs
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use governor::RateLimiter;
use log::{error, info};
use std::sync::Arc;

use sauer_scoreboard::config::Config;
use sauer_scoreboard::handlers;
use sauer_scoreboard::query::extinfo::ExtInfoClient;
use sauer_scoreboard::refresh::RefreshCoordinator;
use sauer_scoreboard::templates::Templates;
use sauer_scoreboard::utils::KeyedLimiter;

fn startup_error(e: impl std::fmt::Display) -> std::io::Error {
    error!("Startup failed: {}", e);
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env();

    let target = config.resolve_target().await.map_err(startup_error)?;
    let templates = Templates::from_file(&config.template_path).map_err(startup_error)?;
    let quota = config.scoreboard_quota().map_err(startup_error)?;

    info!("Querying game server at {} with a {:?} timeout", target.addr, target.timeout);
    let coordinator = web::Data::new(RefreshCoordinator::new(Arc::new(ExtInfoClient::new()), target));
    let templates = web::Data::new(templates);
    let rate_limiter: web::Data<KeyedLimiter> = web::Data::new(RateLimiter::keyed(quota));

    let bind = config.bind();
    let config = web::Data::new(config);

    info!("Starting server on {}", bind);
    HttpServer::new(move || {
        App::new()
            .app_data(coordinator.clone())
            .app_data(templates.clone())
            .app_data(rate_limiter.clone())
            .app_data(config.clone())
            .configure(handlers::configure)
    })
        .bind(&bind)?
        .run().await
}
