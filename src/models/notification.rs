// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::comment::CommentId;
use super::post::PostId;
use super::user::{AuthorSummary, UserId};
use crate::error::SocialError;
use crate::schema::notifications;

pub type NotificationId = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationKind {
    Like,
    Comment,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Like => "LIKE",
            NotificationKind::Comment => "COMMENT",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = SocialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LIKE" => Ok(NotificationKind::Like),
            "COMMENT" => Ok(NotificationKind::Comment),
            other => Err(SocialError::Persistence(format!(
                "unknown notification kind stored: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Notification {
    pub id: NotificationId,
    /// Recipient
    pub user_id: UserId,
    pub actor_id: UserId,
    pub kind: String,
    pub post_id: Option<PostId>,
    pub comment_id: Option<CommentId>,
    pub read: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Insertable, Serialize, Deserialize)]
#[diesel(table_name = notifications)]
pub struct NewNotification {
    pub user_id: UserId,
    pub actor_id: UserId,
    pub kind: String,
    pub post_id: Option<PostId>,
    pub comment_id: Option<CommentId>,
    pub read: bool,
    pub created_at: NaiveDateTime,
}

impl NewNotification {
    /// Notification for `actor` interacting with content owned by `recipient`.
    ///
    /// Returns `None` when the actor is the recipient: nobody is notified about
    /// their own likes or comments.
    pub fn for_interaction(
        kind: NotificationKind,
        recipient: UserId,
        actor: UserId,
        post_id: Option<PostId>,
        comment_id: Option<CommentId>,
        created_at: NaiveDateTime,
    ) -> Option<Self> {
        if recipient == actor {
            return None;
        }
        Some(NewNotification {
            user_id: recipient,
            actor_id: actor,
            kind: kind.as_str().to_string(),
            post_id,
            comment_id,
            read: false,
            created_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: PostId,
    pub content: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentSummary {
    pub id: CommentId,
    pub content: String,
    pub created_at: NaiveDateTime,
}

/// Notification joined with the actor and the content it points at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationView {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: NaiveDateTime,
    pub actor: AuthorSummary,
    pub post: Option<PostSummary>,
    pub comment: Option<CommentSummary>,
}

impl NotificationView {
    pub fn new(
        notification: Notification,
        actor: AuthorSummary,
        post: Option<PostSummary>,
        comment: Option<CommentSummary>,
    ) -> Result<Self, SocialError> {
        Ok(NotificationView {
            id: notification.id,
            kind: notification.kind.parse()?,
            read: notification.read,
            created_at: notification.created_at,
            actor,
            post,
            comment,
        })
    }
}
