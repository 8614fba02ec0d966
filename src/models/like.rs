// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::notification::Notification;
use super::post::PostId;
use super::user::UserId;
use crate::schema::likes;

/// A user's like on a post. At most one row exists per (user, post).
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = likes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Like {
    pub id: i32,
    pub user_id: UserId,
    pub post_id: PostId,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = likes)]
pub struct NewLike {
    pub user_id: UserId,
    pub post_id: PostId,
    pub created_at: NaiveDateTime,
}

/// Outcome of a like toggle inside the store
#[derive(Debug, Clone, PartialEq)]
pub struct LikeToggle {
    pub liked: bool,
    /// Notification written in the same transaction, if any
    pub notification: Option<Notification>,
}

/// Like state returned to the client after a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeState {
    pub post_id: PostId,
    pub liked: bool,
    pub like_count: i64,
}
