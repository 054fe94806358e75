//! Game catalogue resource.
//!
//! A small CRUD resource whose responses go through content negotiation,
//! so every representation is reachable over HTTP.
//!
//! | Method | Path |
//! |---|---|
//! | GET | `/api/game/v2` |
//! | GET | `/api/game/v2/{id}` |
//! | GET | `/api/game/v2/findGameByName/{name}` |
//! | POST, PUT | `/api/game/v2` |
//! | DELETE | `/api/game/v2/{id}`, `/api/game/v1/{id}` |

pub mod handlers;
pub mod model;
pub mod store;

pub use model::{Game, GameCollection, NewGame};
pub use store::GameStore;

use axum::{
    routing::{delete, get},
    Router,
};

use crate::http::server::AppState;
use self::handlers::*;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/game/v2",
            get(list_games).post(create_game).put(update_game),
        )
        .route("/api/game/v2/{id}", get(get_game).delete(delete_game))
        .route("/api/game/v2/findGameByName/{name}", get(find_games_by_name))
        .route("/api/game/v1/{id}", delete(delete_game))
}
