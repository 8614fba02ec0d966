// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::{extract::State, response::Response};
use tracing::debug;

use crate::api::routes::{found, respond};
use crate::api::{ApiJson, ApiPath, ApiQuery, AppState, CurrentUser, PaginationParams};
use crate::models::ProfileUpdate;

/// The signed-in user's own record, `null` for anonymous callers
pub async fn get_me(State(state): State<AppState>, CurrentUser(viewer): CurrentUser) -> Response {
    respond("current_user", state.service.current_user(viewer).await)
}

pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    ApiPath(username): ApiPath<String>,
) -> Response {
    debug!("Getting profile for username: {}", username);
    respond(
        "get_profile",
        found(state.service.get_profile(viewer, &username).await, "profile"),
    )
}

pub async fn get_profile_posts(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    ApiPath(username): ApiPath<String>,
    ApiQuery(params): ApiQuery<PaginationParams>,
) -> Response {
    let limit = params.limit(state.max_limit);
    respond(
        "get_user_posts",
        state.service.get_user_posts(viewer, &username, limit).await,
    )
}

pub async fn get_profile_likes(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    ApiPath(username): ApiPath<String>,
    ApiQuery(params): ApiQuery<PaginationParams>,
) -> Response {
    let limit = params.limit(state.max_limit);
    respond(
        "get_liked_posts",
        state.service.get_liked_posts(viewer, &username, limit).await,
    )
}

pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Response {
    respond("update_profile", state.service.update_profile(viewer, update).await)
}
