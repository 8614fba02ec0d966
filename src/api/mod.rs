// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

mod extract;
mod handlers;
mod routes;

pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use routes::{ApiResponse, PaginationParams};

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::IdentityProvider;
use crate::config::ApiConfig;
use crate::models::UserId;
use crate::service::SocialService;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SocialService>,
    pub identity: Arc<dyn IdentityProvider>,
    /// Upper bound for `?limit=` on feed endpoints
    pub max_limit: usize,
}

/// The local user behind the request, `None` for anonymous callers.
///
/// First sight of a session creates its local user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Option<UserId>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = state.identity.authenticate(&parts.headers).await;
        state
            .service
            .resolve_current_user(session.as_ref())
            .await
            .map(CurrentUser)
            .map_err(|e| routes::error_response("resolve_current_user", e))
    }
}

/// All routes with tracing and, when enabled, permissive CORS
pub fn router(state: AppState, enable_cors: bool) -> Router {
    let app = Router::new()
        // General routes
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::get_metrics))
        // Posts, comments and likes
        .route("/api/feed", get(handlers::posts::get_feed))
        .route("/api/posts", post(handlers::posts::create_post))
        .route(
            "/api/posts/:id",
            get(handlers::posts::get_post).delete(handlers::posts::delete_post),
        )
        .route("/api/posts/:id/comments", post(handlers::posts::create_comment))
        .route("/api/posts/:id/like", post(handlers::posts::toggle_like))
        .route("/api/comments/:id", delete(handlers::posts::delete_comment))
        // Profiles
        .route("/api/me", get(handlers::profiles::get_me))
        .route("/api/profile", put(handlers::profiles::update_profile))
        .route("/api/profiles/:username", get(handlers::profiles::get_profile))
        .route("/api/profiles/:username/posts", get(handlers::profiles::get_profile_posts))
        .route("/api/profiles/:username/likes", get(handlers::profiles::get_profile_likes))
        // Social graph
        .route("/api/users/search", get(handlers::social_graph::search_users))
        .route("/api/users/:id/follow", post(handlers::social_graph::toggle_follow))
        .route("/api/users/:id/following", get(handlers::social_graph::get_following))
        // Notifications
        .route("/api/notifications", get(handlers::notifications::list_notifications))
        .route("/api/notifications/unread", get(handlers::notifications::unread_count))
        .route("/api/notifications/read", post(handlers::notifications::mark_read))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        app
    }
}

/// Serve the API until `shutdown` resolves
pub async fn start_api_server<F>(state: AppState, config: &ApiConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state, config.enable_cors);

    let addr = format!("{}:{}", config.host, config.port).parse::<SocketAddr>()?;

    info!("Starting API server on {}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("API server stopped");
    Ok(())
}
