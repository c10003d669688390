//! Lobby and game-session coordination engine for a realtime multiplayer quiz.
//!
//! The library crate exposes every layer so the server binary and integration
//! tests share the same surface: configuration, storage ports, wire DTOs,
//! routes, services, and the shared runtime state.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
