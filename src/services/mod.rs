//! Business logic on top of the shared state and storage ports.

/// OpenAPI documentation assembly.
pub mod documentation;
/// Session runner, answer intake, and abandonment sweeping.
pub mod game_service;
/// Hall-of-fame submission, leaderboards, and per-user aggregates.
pub mod hall_of_fame_service;
/// Storage-backed health probing.
pub mod health_service;
/// Lobby lifecycle and membership.
pub mod lobby_service;
/// Pure scoring rules.
pub mod scoring;
/// Per-connection WebSocket handling.
pub mod websocket_service;
/// Event names and broadcast helpers for the realtime surface.
pub mod ws_events;
