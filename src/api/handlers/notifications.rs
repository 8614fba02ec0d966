// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::{extract::State, response::Response};
use serde::Deserialize;
use serde_json::json;

use crate::api::routes::respond;
use crate::api::{ApiJson, AppState, CurrentUser};
use crate::models::NotificationId;

#[derive(Debug, Default, Deserialize)]
pub struct MarkReadRequest {
    #[serde(default)]
    pub ids: Vec<NotificationId>,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
) -> Response {
    respond("list_notifications", state.service.list_notifications(viewer).await)
}

pub async fn unread_count(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
) -> Response {
    let result = state
        .service
        .unread_count(viewer)
        .await
        .map(|count| json!({ "count": count }));
    respond("unread_count", result)
}

pub async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    ApiJson(request): ApiJson<MarkReadRequest>,
) -> Response {
    let result = state
        .service
        .mark_notifications_read(viewer, &request.ids)
        .await
        .map(|updated| json!({ "updated": updated }));
    respond("mark_notifications_read", result)
}
