//! Client library for the task manager REST API.
//!
//! Layers, leaf to root:
//! *   [`session`]: where the login token and user id are persisted.
//! *   [`http`]: base-URL bound HTTP client that attaches the bearer token.
//! *   [`api`]: one function per endpoint, with uniform [`error::ApiError`]s.
//! *   [`context`]: the acting user and their role, resolved per navigation.
//! *   [`pages`]: page controllers holding form drafts, filters and messages.
//! *   [`commands`] and [`tui`]: the command line and the interactive UI.

pub mod api;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod logging;
pub mod models;
pub mod pages;
pub mod session;
pub mod tui;
