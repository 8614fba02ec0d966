// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::{extract::State, response::Response};
use serde::Deserialize;

use crate::api::routes::respond;
use crate::api::{ApiPath, ApiQuery, AppState, CurrentUser};
use crate::models::{FollowState, UserId};

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

pub async fn toggle_follow(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    ApiPath(user_id): ApiPath<UserId>,
) -> Response {
    respond("toggle_follow", state.service.toggle_follow(viewer, user_id).await)
}

/// Whether the caller follows `user_id`
pub async fn get_following(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    ApiPath(user_id): ApiPath<UserId>,
) -> Response {
    let result = state
        .service
        .is_following(viewer, user_id)
        .await
        .map(|following| FollowState { user_id, following });
    respond("is_following", result)
}

pub async fn search_users(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Response {
    respond("search_users", state.service.search_users(viewer, &params.q).await)
}
