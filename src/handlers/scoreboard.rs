// src/handlers/scoreboard.rs
use actix_web::{web, HttpRequest, HttpResponse};

use crate::config::Config;
use crate::refresh::RefreshCoordinator;
use crate::utils::{KeyedLimiter, RequestError};

use super::load_scoreboard;

pub async fn get_scoreboard(
    req: HttpRequest,
    coordinator: web::Data<RefreshCoordinator>,
    rate_limiter: web::Data<KeyedLimiter>,
    config: web::Data<Config>,
) -> Result<HttpResponse, RequestError> {
    let board = load_scoreboard(&req, &coordinator, &rate_limiter, &config).await?;
    Ok(HttpResponse::Ok().json(board))
}
