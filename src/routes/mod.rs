use axum::Router;

use crate::state::SharedState;

pub mod auth;
pub mod docs;
pub mod game;
pub mod hall_of_fame;
pub mod health;
pub mod lobby;
pub mod scoring;
pub mod websocket;

/// Assemble every resource router plus the documentation UI into one tree.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(lobby::router())
        .merge(game::router())
        .merge(scoring::router())
        .merge(hall_of_fame::router())
        .merge(websocket::router())
        .merge(docs::router(state.clone()))
        .with_state(state)
}
