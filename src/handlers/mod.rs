// src/handlers/mod.rs
pub mod index;
pub mod scoreboard;

use actix_web::{web, HttpRequest};
use log::{debug, error};

use crate::config::Config;
use crate::models::scoreboard::Scoreboard;
use crate::refresh::RefreshCoordinator;
use crate::utils::{extract_client_ip, KeyedLimiter, RequestError};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index::index))
        .route("/health", web::get().to(index::health))
        .route("/api/scoreboard", web::get().to(scoreboard::get_scoreboard));
}

/// Rate limits the caller, then builds the scoreboard from a fresh snapshot.
async fn load_scoreboard(
    req: &HttpRequest,
    coordinator: &RefreshCoordinator,
    rate_limiter: &KeyedLimiter,
    config: &Config,
) -> Result<Scoreboard, RequestError> {
    let client_ip = extract_client_ip(req, config.trust_forwarded_for)?;
    if rate_limiter.check_key(&client_ip).is_err() {
        debug!("Rate limit exceeded for scoreboard for ip: {}", client_ip);
        return Err(RequestError::RateLimitExceeded);
    }

    let snapshot = coordinator.get_fresh().await.map_err(|e| {
        error!("Failed to refresh scoreboard from {}: {}", coordinator.target().addr, e);
        RequestError::ServerUnreachable(e)
    })?;
    Ok(Scoreboard::from(snapshot.as_ref()))
}
