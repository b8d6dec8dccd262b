//! HTTP API for the table server.
//!
//! Handlers translate REST calls into [`TableManager`] calls and return
//! per-player JSON views. There is no authentication: the player id in the
//! path is trusted.
//!
//! # Endpoints
//!
//! ```text
//! GET    /health                                         - Health check
//! GET    /api/v1/games                                   - List games
//! POST   /api/v1/games                                   - Create a game
//! GET    /api/v1/games/{game_id}?player=<id>             - View of a game
//! DELETE /api/v1/games/{game_id}                         - Close a game
//! GET    /api/v1/games/{game_id}/players                 - Seated players
//! POST   /api/v1/games/{game_id}/players                 - Take a seat
//! DELETE /api/v1/games/{game_id}/players/{player_id}     - Leave the table
//! POST   /api/v1/games/{game_id}/players/{player_id}/acts - Take an action
//! POST   /api/v1/games/{game_id}/hands                   - Deal a hand
//! POST   /api/v1/games/{game_id}/streets                 - Deal the next street
//! POST   /api/v1/games/{game_id}/settlement              - Pay out the pots
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use poker_table::{TableConfig, TableManager};
//! use pt_server::api::{AppState, create_router};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = AppState {
//!     table_manager: Arc::new(TableManager::new(10)),
//!     table_defaults: TableConfig::default(),
//! };
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively; the server is meant to sit behind
//! whatever serves the front end.

pub mod games;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
};
use poker_table::{TableConfig, TableManager};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub table_manager: Arc<TableManager>,
    /// Base configuration for games created over the API.
    pub table_defaults: TableConfig,
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", create_v1_router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/games", get(games::list_games).post(games::create_game))
        .route(
            "/games/{game_id}",
            get(games::get_game).delete(games::close_game),
        )
        .route(
            "/games/{game_id}/players",
            get(games::list_players).post(games::seat_player),
        )
        .route(
            "/games/{game_id}/players/{player_id}",
            delete(games::unseat_player),
        )
        .route(
            "/games/{game_id}/players/{player_id}/acts",
            post(games::take_action),
        )
        .route("/games/{game_id}/hands", post(games::start_hand))
        .route("/games/{game_id}/streets", post(games::advance_street))
        .route("/games/{game_id}/settlement", post(games::settle_hand))
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","version":"0.1.0","tables":{"active_count":1},"timestamp":"..."}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let table_count = state.table_manager.active_table_count().await;

    let response = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "tables": {
            "active_count": table_count
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(response))
}
