//! Game API handlers.
//!
//! This module provides HTTP REST endpoints for table operations including:
//! - Creating, listing, and closing games
//! - Taking and leaving seats
//! - Dealing hands and streets, taking actions, and settling pots
//! - Per-player views of a game
//!
//! # Examples
//!
//! Take a seat:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/games/$GAME/players \
//!   -H "Content-Type: application/json" \
//!   -d '{"handle": "alice", "seat": 0, "stack": 1000}'
//! ```
//!
//! Raise by 100 on top of the call:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/games/$GAME/players/$PLAYER/acts \
//!   -H "Content-Type: application/json" \
//!   -d '{"action": {"type": "raise", "amount": 100}}'
//! ```

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use poker_table::{
    GameView, TableConfig, TableError, TableManagerError,
    constants::DEFAULT_BUY_IN,
    entities::{Action, ActionRecord, Chips, GameId, HandSummary, PlayerId, SeatIndex, Street},
    game::views::SeatView,
    table::TableInfo,
};
use serde::{Deserialize, Serialize};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<T, ApiError>;

/// Game settings for a new table. Anything left out comes from the
/// server's table defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateGameRequest {
    pub name: Option<String>,
    pub max_players: Option<usize>,
    pub small_blind: Option<Chips>,
    pub big_blind: Option<Chips>,
    pub action_timeout_secs: Option<i64>,
    pub seed: Option<u64>,
    pub auto_advance: Option<bool>,
}

impl CreateGameRequest {
    fn into_config(self, defaults: &TableConfig) -> TableConfig {
        TableConfig {
            name: self.name.unwrap_or_else(|| defaults.name.clone()),
            max_players: self.max_players.unwrap_or(defaults.max_players),
            small_blind: self.small_blind.unwrap_or(defaults.small_blind),
            big_blind: self.big_blind.unwrap_or(defaults.big_blind),
            action_timeout_secs: self
                .action_timeout_secs
                .unwrap_or(defaults.action_timeout_secs),
            seed: self.seed.or(defaults.seed),
            auto_advance: self.auto_advance.unwrap_or(defaults.auto_advance),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GameCreated {
    #[serde(rename = "gameID")]
    pub game_id: GameId,
}

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    /// Whose hole cards to show. Spectator view when missing.
    pub player: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeatRequest {
    /// Identity to seat. A fresh one is handed out when missing.
    #[serde(rename = "playerID", default)]
    pub player_id: Option<String>,
    #[serde(default)]
    pub handle: String,
    pub seat: SeatIndex,
    pub stack: Option<Chips>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SeatResponse {
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    pub seat: SeatIndex,
    pub stack: Chips,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LeaveResponse {
    /// The fold recorded when the player left in the middle of a hand.
    pub action: Option<ActionRecord>,
}

#[derive(Debug, Deserialize)]
pub struct TakeActionRequest {
    pub action: Action,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StreetResponse {
    pub street: Street,
}

fn status_for(err: &TableManagerError) -> StatusCode {
    match err {
        TableManagerError::TableNotFound(_) => StatusCode::NOT_FOUND,
        TableManagerError::TableClosed(_) | TableManagerError::CapacityReached(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        TableManagerError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        TableManagerError::Rejected(err) => match err {
            TableError::UnknownPlayer(_) => StatusCode::NOT_FOUND,
            TableError::InvalidSeat(_)
            | TableError::IllegalAction(_)
            | TableError::StackTooLarge(_) => StatusCode::BAD_REQUEST,
            TableError::DeckExhausted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            TableError::SeatOccupied(_)
            | TableError::DuplicatePlayer(_)
            | TableError::InsufficientPlayers
            | TableError::BettingIncomplete
            | TableError::NotYourTurn
            | TableError::HandInProgress
            | TableError::NoHandInProgress
            | TableError::AwaitingSettlement => StatusCode::CONFLICT,
        },
    }
}

fn api_error(err: TableManagerError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), "{err}");
    } else {
        tracing::debug!(status = status.as_u16(), "{err}");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

/// List all open games.
///
/// # Response
///
/// Returns `200 OK` with an array of game summaries:
/// ```json
/// [
///   {
///     "id": "0b6f3c1e-7f0e-4a55-9d55-1f3c7f6a2b10",
///     "name": "Table 1",
///     "player_count": 2,
///     "max_players": 10,
///     "small_blind": 25,
///     "big_blind": 50,
///     "hand_number": 4,
///     "phase": "flop betting"
///   }
/// ]
/// ```
pub async fn list_games(State(state): State<AppState>) -> Json<Vec<TableInfo>> {
    Json(state.table_manager.list_tables().await)
}

/// Create a game.
///
/// # Errors
///
/// - `400 Bad Request`: Invalid blinds, seat count, or timeout
/// - `503 Service Unavailable`: Table limit reached
pub async fn create_game(
    State(state): State<AppState>,
    Json(request): Json<CreateGameRequest>,
) -> ApiResult<(StatusCode, Json<GameCreated>)> {
    let config = request.into_config(&state.table_defaults);
    let name = config.name.clone();
    let game_id = state
        .table_manager
        .create_table(config)
        .await
        .map_err(api_error)?;

    tracing::info!(%game_id, name = %name, "Game created");
    Ok((StatusCode::CREATED, Json(GameCreated { game_id })))
}

/// Get the view of a game. Only the hole cards of `?player=<id>` are shown.
///
/// # Errors
///
/// - `404 Not Found`: Game doesn't exist
pub async fn get_game(
    State(state): State<AppState>,
    Path(game_id): Path<GameId>,
    Query(query): Query<ViewQuery>,
) -> ApiResult<Json<GameView>> {
    let viewer = query.player.map(PlayerId::from);
    state
        .table_manager
        .view(game_id, viewer)
        .await
        .map(Json)
        .map_err(api_error)
}

/// Close a game. Players still seated are dropped with it.
pub async fn close_game(
    State(state): State<AppState>,
    Path(game_id): Path<GameId>,
) -> ApiResult<StatusCode> {
    state
        .table_manager
        .close_table(game_id)
        .await
        .map_err(api_error)?;

    tracing::info!(%game_id, "Game closed");
    Ok(StatusCode::NO_CONTENT)
}

/// Seated players, starting from the small blind.
pub async fn list_players(
    State(state): State<AppState>,
    Path(game_id): Path<GameId>,
) -> ApiResult<Json<Vec<SeatView>>> {
    let view = state
        .table_manager
        .view(game_id, None)
        .await
        .map_err(api_error)?;
    Ok(Json(view.table))
}

/// Take a seat.
///
/// # Request Body
///
/// ```json
/// {
///   "playerID": "optional id, generated when missing",
///   "handle": "alice",
///   "seat": 0,
///   "stack": 1000
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Seat doesn't exist
/// - `404 Not Found`: Game doesn't exist
/// - `409 Conflict`: Seat taken or player already seated
pub async fn seat_player(
    State(state): State<AppState>,
    Path(game_id): Path<GameId>,
    Json(request): Json<SeatRequest>,
) -> ApiResult<(StatusCode, Json<SeatResponse>)> {
    let player_id = request
        .player_id
        .map_or_else(PlayerId::random, PlayerId::from);
    let stack = request.stack.unwrap_or(DEFAULT_BUY_IN);

    state
        .table_manager
        .seat_player(
            game_id,
            player_id.clone(),
            request.handle,
            request.seat,
            stack,
        )
        .await
        .map_err(api_error)?;

    tracing::info!(%game_id, %player_id, seat = request.seat, "Player seated");
    Ok((
        StatusCode::CREATED,
        Json(SeatResponse {
            player_id,
            seat: request.seat,
            stack,
        }),
    ))
}

/// Leave the table. In the middle of a hand the player folds and is
/// removed once the hand is settled.
///
/// # Errors
///
/// - `404 Not Found`: Game doesn't exist or player isn't seated
pub async fn unseat_player(
    State(state): State<AppState>,
    Path((game_id, player_id)): Path<(GameId, String)>,
) -> ApiResult<Json<LeaveResponse>> {
    let player_id = PlayerId::from(player_id);
    let action = state
        .table_manager
        .unseat_player(game_id, player_id.clone())
        .await
        .map_err(api_error)?;

    tracing::info!(%game_id, %player_id, "Player left");
    Ok(Json(LeaveResponse { action }))
}

/// Take a poker action (fold, check, call, bet, raise, all-in).
///
/// # Request Body
///
/// ```json
/// {"action": {"type": "bet", "amount": 100}}
/// ```
///
/// # Response
///
/// The recorded action. When the player's turn had already expired this
/// is the timeout action, flagged with `"timed_out": true`.
///
/// # Errors
///
/// - `400 Bad Request`: Illegal action
/// - `409 Conflict`: Not this player's turn, or no betting open
pub async fn take_action(
    State(state): State<AppState>,
    Path((game_id, player_id)): Path<(GameId, String)>,
    Json(request): Json<TakeActionRequest>,
) -> ApiResult<Json<ActionRecord>> {
    let record = state
        .table_manager
        .take_action(game_id, PlayerId::from(player_id), request.action)
        .await
        .map_err(api_error)?;

    tracing::debug!(%game_id, "{record}");
    Ok(Json(record))
}

/// Deal a new hand. Returns the spectator view of the new hand.
///
/// # Errors
///
/// - `409 Conflict`: A hand is running or too few players have chips
pub async fn start_hand(
    State(state): State<AppState>,
    Path(game_id): Path<GameId>,
) -> ApiResult<(StatusCode, Json<GameView>)> {
    state
        .table_manager
        .start_hand(game_id)
        .await
        .map_err(api_error)?;
    let view = state
        .table_manager
        .view(game_id, None)
        .await
        .map_err(api_error)?;

    tracing::info!(%game_id, hand_number = view.hand_number, "Hand started");
    Ok((StatusCode::CREATED, Json(view)))
}

/// Deal the next street once betting on the current one is complete.
///
/// # Errors
///
/// - `409 Conflict`: Betting incomplete, no hand, or waiting for settlement
pub async fn advance_street(
    State(state): State<AppState>,
    Path(game_id): Path<GameId>,
) -> ApiResult<Json<StreetResponse>> {
    let street = state
        .table_manager
        .advance_street(game_id)
        .await
        .map_err(api_error)?;
    Ok(Json(StreetResponse { street }))
}

/// Pay out every pot once betting is over.
///
/// # Errors
///
/// - `409 Conflict`: Betting still running or no hand
pub async fn settle_hand(
    State(state): State<AppState>,
    Path(game_id): Path<GameId>,
) -> ApiResult<Json<HandSummary>> {
    let summary = state
        .table_manager
        .settle_hand(game_id)
        .await
        .map_err(api_error)?;

    tracing::info!(
        %game_id,
        hand_number = summary.hand_number,
        winners = summary.payouts.len(),
        "Hand settled"
    );
    Ok(Json(summary))
}
