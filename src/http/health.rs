use actix_web::{web, HttpResponse, Result};

use crate::api_error::ApiError;
use crate::http::AppState;
use crate::store::LeagueStore;

pub async fn health_check<S: LeagueStore>(
    state: web::Data<AppState<S>>,
) -> Result<HttpResponse, ApiError> {
    state.store.ping().await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "database": "ok"
    })))
}
