//! Library crate for tourney-back, exposing modules for binaries and integration tests.

/// TTL caches and clocks.
pub mod cache;
/// Runtime configuration.
pub mod config;
/// Row store access and entity models.
pub mod dao;
/// Request and response shapes of the REST API.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// Bulk retrieval of paginated collections.
pub mod fetcher;
/// HTTP routes.
pub mod routes;
/// Business logic over the shared state.
pub mod services;
/// Shared application state.
pub mod state;
