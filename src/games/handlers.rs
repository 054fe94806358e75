use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};

use crate::games::model::{Game, GameCollection, NewGame};
use crate::http::negotiate::Negotiated;
use crate::http::response::{ApiError, ApiResult};
use crate::http::server::AppState;
use crate::policy::MediaType;

const GAME_ROOT: &str = "Game";
const COLLECTION_ROOT: &str = "Games";

pub async fn list_games(
    State(state): State<AppState>,
    media_type: MediaType,
) -> Negotiated<GameCollection> {
    let games = state.games.list();
    Negotiated::new(media_type, GameCollection { games }).root(COLLECTION_ROOT)
}

pub async fn get_game(
    State(state): State<AppState>,
    media_type: MediaType,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<Negotiated<Game>> {
    let Path(id) = id?;
    let game = state
        .games
        .get(id)
        .ok_or_else(|| ApiError::NotFound(format!("game {id}")))?;
    Ok(Negotiated::new(media_type, game).root(GAME_ROOT))
}

pub async fn find_games_by_name(
    State(state): State<AppState>,
    media_type: MediaType,
    name: Result<Path<String>, PathRejection>,
) -> ApiResult<Negotiated<GameCollection>> {
    let Path(name) = name?;
    let games = state.games.find_by_name(&name);
    Ok(Negotiated::new(media_type, GameCollection { games }).root(COLLECTION_ROOT))
}

pub async fn create_game(
    State(state): State<AppState>,
    media_type: MediaType,
    payload: Result<Json<NewGame>, JsonRejection>,
) -> ApiResult<Negotiated<Game>> {
    let Json(new_game) = payload?;
    new_game.validate()?;
    let game = state.games.create(new_game);
    tracing::info!(id = game.id, name = %game.name, "Game added to catalogue");
    Ok(Negotiated::new(media_type, game)
        .root(GAME_ROOT)
        .status(StatusCode::CREATED))
}

pub async fn update_game(
    State(state): State<AppState>,
    media_type: MediaType,
    payload: Result<Json<Game>, JsonRejection>,
) -> ApiResult<Negotiated<Game>> {
    let Json(game) = payload?;
    game.validate()?;
    let id = game.id;
    let game = state
        .games
        .update(game)
        .ok_or_else(|| ApiError::NotFound(format!("game {id}")))?;
    Ok(Negotiated::new(media_type, game).root(GAME_ROOT))
}

pub async fn delete_game(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    if state.games.delete(id) {
        tracing::info!(id, "Game removed from catalogue");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("game {id}")))
    }
}
