use actix_web::{web, HttpResponse, Responder};

use crate::api_error::ApiError;
use crate::http::AppState;
use crate::models::StatsQuery;
use crate::store::LeagueStore;

/// GET /api/players/:id/stats?matchType=
pub async fn player_stats<S: LeagueStore>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
    query: web::Query<StatsQuery>,
) -> Result<impl Responder, ApiError> {
    let player_id = path.into_inner();
    // Unknown ids are a 404 rather than an all-zero record.
    state.players.get_player(&player_id).await?;

    let stats = state.stats.player_stats(&player_id, query.match_type).await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// GET /api/players/:id/partners
pub async fn partners<S: LeagueStore>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    let partners = state.stats.partners(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(partners))
}

/// GET /api/ranking?matchType=
pub async fn ranking<S: LeagueStore>(
    state: web::Data<AppState<S>>,
    query: web::Query<StatsQuery>,
) -> Result<impl Responder, ApiError> {
    let ranking = state.stats.ranking(query.match_type).await?;
    Ok(HttpResponse::Ok().json(ranking))
}

/// GET /api/home
pub async fn home<S: LeagueStore>(state: web::Data<AppState<S>>) -> Result<impl Responder, ApiError> {
    let summary = state.stats.home().await?;
    Ok(HttpResponse::Ok().json(summary))
}

pub fn configure_routes<S: LeagueStore + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/ranking", web::get().to(ranking::<S>))
        .route("/api/home", web::get().to(home::<S>));
}
