//! The HTTP surface of the API.
//!
//! GraphQL lives at the root; plan widgets, email answer links and the
//! migration pages are plain routes alongside it.

use axum::extract::Extension;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::graphql::{playground, query};
use crate::state::AppState;

pub mod migration;
pub mod plan;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(playground).post(query))
        .merge(plan::routes())
        .merge(migration::routes())
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
