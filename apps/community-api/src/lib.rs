pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod service;

use service::CommunityService;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: CommunityService,
}
