// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::comment::{Comment, CommentView};
use super::user::{AuthorSummary, UserId};
use crate::schema::posts;

pub type PostId = i32;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub image: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = posts)]
pub struct NewPost {
    pub author_id: UserId,
    pub content: String,
    pub image: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Which posts a feed walks over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "user_id", rename_all = "snake_case")]
pub enum FeedFilter {
    All,
    Author(UserId),
    LikedBy(UserId),
}

/// Keyset position in `(created_at DESC, id DESC)` order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCursor {
    pub created_at: NaiveDateTime,
    pub id: PostId,
}

impl FeedCursor {
    pub fn of(post: &Post) -> Self {
        FeedCursor {
            created_at: post.created_at,
            id: post.id,
        }
    }

    /// True if `post` sorts strictly after this cursor in feed order
    pub fn precedes(&self, post: &Post) -> bool {
        post.created_at < self.created_at
            || (post.created_at == self.created_at && post.id < self.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostQuery {
    pub filter: FeedFilter,
    pub after: Option<FeedCursor>,
    pub limit: i64,
}

/// Likes and comments for a batch of posts, read from one snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostDetails {
    pub like_counts: HashMap<PostId, i64>,
    pub likers: HashMap<PostId, Vec<UserId>>,
    pub comments: HashMap<PostId, Vec<CommentView>>,
}

impl PostDetails {
    /// Group flat query rows by post id. Row order is preserved within a post.
    pub fn from_rows(
        counts: Vec<(PostId, i64)>,
        likes: Vec<(PostId, UserId)>,
        comments: Vec<(Comment, AuthorSummary)>,
    ) -> Self {
        let mut details = PostDetails {
            like_counts: counts.into_iter().collect(),
            ..Default::default()
        };
        for (post_id, user_id) in likes {
            details.likers.entry(post_id).or_default().push(user_id);
        }
        for (comment, author) in comments {
            details
                .comments
                .entry(comment.post_id)
                .or_default()
                .push(CommentView::new(comment, author));
        }
        details
    }
}

/// Posts with their authors and details, read from one snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostPage {
    pub rows: Vec<(Post, AuthorSummary)>,
    pub details: PostDetails,
}

impl PostPage {
    pub fn post_ids(rows: &[(Post, AuthorSummary)]) -> Vec<PostId> {
        rows.iter().map(|(post, _)| post.id).collect()
    }

    /// Cursor after the last row, when the page came back full
    pub fn next_cursor(&self, page_size: i64) -> Option<FeedCursor> {
        if self.rows.len() as i64 == page_size {
            self.rows.last().map(|(post, _)| FeedCursor::of(post))
        } else {
            None
        }
    }

    pub fn into_views(self, viewer: Option<UserId>) -> Vec<PostView> {
        assemble_post_views(self.rows, self.details, viewer)
    }
}

/// Denormalized post as rendered in the feed and on the post page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostView {
    pub id: PostId,
    pub content: String,
    pub image: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub author: AuthorSummary,
    pub comments: Vec<CommentView>,
    /// Ids of users who liked the post
    pub likes: Vec<UserId>,
    pub like_count: i64,
    pub liked_by_viewer: bool,
}

/// Join posts with their batched details and derive viewer state
pub fn assemble_post_views(
    rows: Vec<(Post, AuthorSummary)>,
    mut details: PostDetails,
    viewer: Option<UserId>,
) -> Vec<PostView> {
    rows.into_iter()
        .map(|(post, author)| {
            let likes = details.likers.remove(&post.id).unwrap_or_default();
            let liked_by_viewer = viewer.map_or(false, |v| likes.contains(&v));
            PostView {
                id: post.id,
                content: post.content,
                image: post.image,
                created_at: post.created_at,
                updated_at: post.updated_at,
                author,
                comments: details.comments.remove(&post.id).unwrap_or_default(),
                like_count: details.like_counts.get(&post.id).copied().unwrap_or(0),
                likes,
                liked_by_viewer,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 1)
            .and_then(|d| d.and_hms_opt(12, 0, sec))
            .unwrap()
    }

    fn post(id: PostId, sec: u32) -> Post {
        Post {
            id,
            author_id: 1,
            content: format!("post {id}"),
            image: None,
            created_at: at(sec),
            updated_at: at(sec),
        }
    }

    fn author(id: UserId) -> AuthorSummary {
        AuthorSummary {
            id,
            username: format!("user{id}"),
            name: None,
            image: None,
        }
    }

    #[test]
    fn cursor_orders_by_time_then_id() {
        let cursor = FeedCursor::of(&post(5, 10));
        assert!(cursor.precedes(&post(9, 9)));
        assert!(cursor.precedes(&post(4, 10)));
        assert!(!cursor.precedes(&post(6, 10)));
        assert!(!cursor.precedes(&post(5, 10)));
        assert!(!cursor.precedes(&post(1, 11)));
    }

    #[test]
    fn assembly_attaches_details_and_viewer_state() {
        let comment = Comment {
            id: 7,
            post_id: 1,
            author_id: 3,
            content: "nice".into(),
            created_at: at(2),
        };
        let details = PostDetails::from_rows(
            vec![(1, 2)],
            vec![(1, 2), (1, 3)],
            vec![(comment, author(3))],
        );
        let views = assemble_post_views(
            vec![(post(1, 1), author(1)), (post(2, 0), author(1))],
            details,
            Some(3),
        );

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].like_count, 2);
        assert_eq!(views[0].likes, vec![2, 3]);
        assert!(views[0].liked_by_viewer);
        assert_eq!(views[0].comments.len(), 1);
        assert_eq!(views[0].comments[0].author.username, "user3");

        assert_eq!(views[1].like_count, 0);
        assert!(views[1].likes.is_empty());
        assert!(!views[1].liked_by_viewer);
    }

    #[test]
    fn anonymous_viewer_never_likes() {
        let details = PostDetails::from_rows(vec![(1, 1)], vec![(1, 2)], vec![]);
        let views = assemble_post_views(vec![(post(1, 1), author(1))], details, None);
        assert!(!views[0].liked_by_viewer);
    }

    #[test]
    fn next_cursor_only_for_full_pages() {
        let page = PostPage {
            rows: vec![(post(4, 3), author(1)), (post(2, 1), author(1))],
            details: PostDetails::default(),
        };
        assert_eq!(page.next_cursor(2), Some(FeedCursor::of(&post(2, 1))));
        assert_eq!(page.next_cursor(3), None);
        assert_eq!(PostPage::post_ids(&page.rows), vec![4, 2]);
    }
}
