// src/handlers/index.rs
use actix_web::{web, HttpRequest, HttpResponse};
use log::error;

use crate::config::Config;
use crate::refresh::RefreshCoordinator;
use crate::templates::Templates;
use crate::utils::{KeyedLimiter, RequestError};

use super::load_scoreboard;

pub async fn index(
    req: HttpRequest,
    coordinator: web::Data<RefreshCoordinator>,
    templates: web::Data<Templates>,
    rate_limiter: web::Data<KeyedLimiter>,
    config: web::Data<Config>,
) -> Result<HttpResponse, RequestError> {
    let board = load_scoreboard(&req, &coordinator, &rate_limiter, &config).await?;

    let page = templates.render_page(&board).map_err(|e| {
        error!("Failed to render scoreboard: {}", e);
        RequestError::Render
    })?;

    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(page))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().content_type("application/json").body("{\"status\": \"ok\"}")
}
