//! HTTP Adapter - axum routes over the entity controllers
//!
//! Views are JSON; successful submissions redirect back to the list.

pub mod entity;
pub mod extract;
pub mod response;

use axum::Router;
use tower_http::trace::TraceLayer;

use jobbank_domain::{EntityStore, RetrainingProgram, Skill};
use jobbank_usecase::EntityController;

pub use entity::entity_routes;
pub use response::ErrorResponse;

/// Cookie attributes that depend on deployment
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieSettings {
    /// Set the `Secure` flag (serving over HTTPS)
    pub secure: bool,
}

/// The full application router
pub fn router<SS, PS>(
    skills: EntityController<Skill, SS>,
    programs: EntityController<RetrainingProgram, PS>,
    cookies: CookieSettings,
) -> Router
where
    SS: EntityStore<Skill> + 'static,
    PS: EntityStore<RetrainingProgram> + 'static,
{
    Router::new()
        .merge(entity_routes(skills, cookies))
        .merge(entity_routes(programs, cookies))
        .layer(TraceLayer::new_for_http())
}
