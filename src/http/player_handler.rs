use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::info;

use crate::api_error::ApiError;
use crate::http::{stats_handler, AppState};
use crate::models::{PlayerFilter, SavePlayerRequest};
use crate::session::SessionContext;
use crate::store::LeagueStore;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerListQuery {
    #[serde(default)]
    pub creator_id: Option<String>,
}

/// GET /api/players
pub async fn list_players<S: LeagueStore>(
    state: web::Data<AppState<S>>,
    query: web::Query<PlayerListQuery>,
) -> Result<impl Responder, ApiError> {
    let filter = PlayerFilter {
        creator_id: query.into_inner().creator_id,
    };
    let players = state.players.list_players(&filter).await?;
    Ok(HttpResponse::Ok().json(players))
}

/// POST /api/players
/// Create a player, or update it when the body carries an `id`
pub async fn save_player<S: LeagueStore>(
    state: web::Data<AppState<S>>,
    session: SessionContext,
    req: web::Json<SavePlayerRequest>,
) -> Result<impl Responder, ApiError> {
    let req = req.into_inner();
    let created = req.id.is_none();

    info!(name = %req.name, created, "Received save player request");

    let player = state.players.save_player(&session, req).await?;
    if created {
        Ok(HttpResponse::Created().json(player))
    } else {
        Ok(HttpResponse::Ok().json(player))
    }
}

/// GET /api/players/:id
pub async fn get_player<S: LeagueStore>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    let player = state.players.get_player(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(player))
}

/// DELETE /api/players/:id
pub async fn delete_player<S: LeagueStore>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    let player_id = path.into_inner();
    info!(player_id = %player_id, "Received delete player request");

    state.players.delete_player(&player_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/players/:id/avatar
pub async fn get_avatar<S: LeagueStore>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    let avatar = state.players.avatar(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(avatar))
}

/// Configure player routes
pub fn configure_routes<S: LeagueStore + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/players")
            .route("", web::get().to(list_players::<S>))
            .route("", web::post().to(save_player::<S>))
            .route("/{id}", web::get().to(get_player::<S>))
            .route("/{id}", web::delete().to(delete_player::<S>))
            .route("/{id}/avatar", web::get().to(get_avatar::<S>))
            .route("/{id}/stats", web::get().to(stats_handler::player_stats::<S>))
            .route("/{id}/partners", web::get().to(stats_handler::partners::<S>)),
    );
}
