// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::post::PostId;
use super::user::{AuthorSummary, UserId};
use crate::schema::comments;

pub type CommentId = i32;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = comments)]
pub struct NewComment {
    pub post_id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: CommentId,
    pub content: String,
    pub author_id: UserId,
    pub created_at: NaiveDateTime,
    pub author: AuthorSummary,
}

impl CommentView {
    pub fn new(comment: Comment, author: AuthorSummary) -> Self {
        CommentView {
            id: comment.id,
            content: comment.content,
            author_id: comment.author_id,
            created_at: comment.created_at,
            author,
        }
    }
}
