// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::{extract::State, http::StatusCode, response::Response};
use serde::Deserialize;
use tracing::debug;

use crate::api::routes::{found, respond, respond_with};
use crate::api::{ApiJson, ApiPath, ApiQuery, AppState, CurrentUser, PaginationParams};
use crate::models::{CommentId, PostId};
use crate::service::CreatePostRequest;

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub content: String,
}

/// Newest posts across all authors
pub async fn get_feed(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    ApiQuery(params): ApiQuery<PaginationParams>,
) -> Response {
    let limit = params.limit(state.max_limit);
    debug!("Getting feed, limit: {}", limit);
    respond("get_feed", state.service.get_feed(viewer, limit).await)
}

pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    ApiJson(request): ApiJson<CreatePostRequest>,
) -> Response {
    respond_with(
        StatusCode::CREATED,
        "create_post",
        state.service.create_post(viewer, request).await,
    )
}

pub async fn get_post(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    ApiPath(post_id): ApiPath<PostId>,
) -> Response {
    respond(
        "get_post_by_id",
        found(state.service.get_post_by_id(viewer, post_id).await, "post"),
    )
}

pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    ApiPath(post_id): ApiPath<PostId>,
) -> Response {
    respond("delete_post", state.service.delete_post(viewer, post_id).await)
}

pub async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    ApiPath(post_id): ApiPath<PostId>,
    ApiJson(request): ApiJson<CreateCommentRequest>,
) -> Response {
    respond_with(
        StatusCode::CREATED,
        "create_comment",
        state
            .service
            .create_comment(viewer, post_id, &request.content)
            .await,
    )
}

pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    ApiPath(comment_id): ApiPath<CommentId>,
) -> Response {
    respond(
        "delete_comment",
        state.service.delete_comment(viewer, comment_id).await,
    )
}

pub async fn toggle_like(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    ApiPath(post_id): ApiPath<PostId>,
) -> Response {
    respond("toggle_like", state.service.toggle_like(viewer, post_id).await)
}
