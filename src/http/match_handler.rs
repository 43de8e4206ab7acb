use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::info;

use crate::api_error::ApiError;
use crate::http::AppState;
use crate::models::*;
use crate::session::SessionContext;
use crate::store::LeagueStore;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchListQuery {
    #[serde(default)]
    pub status: Option<MatchStatus>,
    #[serde(rename = "type", default)]
    pub match_type: Option<MatchType>,
    #[serde(default)]
    pub player_id: Option<String>,
}

impl From<MatchListQuery> for MatchFilter {
    fn from(query: MatchListQuery) -> Self {
        MatchFilter {
            status: query.status,
            match_type: query.match_type,
            player_id: query.player_id,
        }
    }
}

// =============================================================================
// READS
// =============================================================================

/// GET /api/matches
pub async fn list_matches<S: LeagueStore>(
    state: web::Data<AppState<S>>,
    query: web::Query<MatchListQuery>,
) -> Result<impl Responder, ApiError> {
    let filter = MatchFilter::from(query.into_inner());
    let matches = state.matches.list_matches(&filter).await?;
    Ok(HttpResponse::Ok().json(matches))
}

/// GET /api/matches/:id
pub async fn get_match<S: LeagueStore>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    let m = state.matches.get_match(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(m))
}

/// GET /api/matches/:id/cookie
/// Shutout details, `null` when the match was not a cookie
pub async fn get_cookie<S: LeagueStore>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    let outcome = state.matches.cookie(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

// =============================================================================
// CREATE
// =============================================================================

/// POST /api/matches
pub async fn create_match<S: LeagueStore>(
    state: web::Data<AppState<S>>,
    req: web::Json<CreateMatchRequest>,
) -> Result<impl Responder, ApiError> {
    info!(
        match_type = %req.match_type,
        team1 = ?req.team1,
        team2 = ?req.team2,
        "Received create match request"
    );

    let m = state.matches.create_match(req.into_inner()).await?;
    Ok(HttpResponse::Created().json(m))
}

/// POST /api/matches/balanced
/// Create an officiel match from the least-played players
pub async fn create_balanced_match<S: LeagueStore>(
    state: web::Data<AppState<S>>,
) -> Result<impl Responder, ApiError> {
    info!("Received balanced match request");

    let m = state.matches.create_balanced_match().await?;
    Ok(HttpResponse::Created().json(m))
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// PATCH /api/matches/:id
/// Merge the given fields into the stored match
pub async fn update_match<S: LeagueStore>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
    req: web::Json<MatchUpdate>,
) -> Result<impl Responder, ApiError> {
    let match_id = path.into_inner();
    info!(match_id = %match_id, "Received update match request");

    let m = state.matches.update_match(&match_id, req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(m))
}

/// POST /api/matches/:id/start
pub async fn start_match<S: LeagueStore>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    let m = state.matches.start_match(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(m))
}

/// POST /api/matches/:id/cancel
pub async fn cancel_match<S: LeagueStore>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    let m = state.matches.cancel_match(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(m))
}

/// POST /api/matches/:id/finalize
pub async fn finalize_match<S: LeagueStore>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    let m = state.matches.finalize_match(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(m))
}

/// POST /api/matches/:id/bet
pub async fn place_bet<S: LeagueStore>(
    state: web::Data<AppState<S>>,
    session: SessionContext,
    path: web::Path<String>,
    req: web::Json<PlaceBetRequest>,
) -> Result<impl Responder, ApiError> {
    let m = state
        .matches
        .place_bet(&session, &path.into_inner(), req.bet)
        .await?;
    Ok(HttpResponse::Ok().json(m))
}

// =============================================================================
// SCORING
// =============================================================================

/// POST /api/matches/:id/goals
pub async fn record_goal<S: LeagueStore>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
    req: web::Json<RecordGoalRequest>,
) -> Result<impl Responder, ApiError> {
    let m = state
        .matches
        .record_goal(&path.into_inner(), req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(m))
}

/// POST /api/matches/:id/score
pub async fn adjust_score<S: LeagueStore>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
    req: web::Json<AdjustScoreRequest>,
) -> Result<impl Responder, ApiError> {
    let m = state
        .matches
        .adjust_score(&path.into_inner(), req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(m))
}

/// Configure match routes. `/balanced` is registered ahead of `/{id}`.
pub fn configure_routes<S: LeagueStore + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/matches")
            .route("", web::get().to(list_matches::<S>))
            .route("", web::post().to(create_match::<S>))
            .route("/balanced", web::post().to(create_balanced_match::<S>))
            .route("/{id}", web::get().to(get_match::<S>))
            .route("/{id}", web::patch().to(update_match::<S>))
            .route("/{id}/start", web::post().to(start_match::<S>))
            .route("/{id}/cancel", web::post().to(cancel_match::<S>))
            .route("/{id}/finalize", web::post().to(finalize_match::<S>))
            .route("/{id}/bet", web::post().to(place_bet::<S>))
            .route("/{id}/goals", web::post().to(record_goal::<S>))
            .route("/{id}/score", web::post().to(adjust_score::<S>))
            .route("/{id}/cookie", web::get().to(get_cookie::<S>)),
    );
}
