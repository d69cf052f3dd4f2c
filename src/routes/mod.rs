pub mod analysis;
pub mod auth;
pub mod subscription;
pub mod usage;

use axum::Router;
use std::sync::Arc;

use crate::AppState;

/// Build all routes for the API
pub fn build_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(auth::routes())
        .merge(analysis::routes())
        .merge(usage::routes())
        .merge(subscription::routes())
}
