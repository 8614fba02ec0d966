// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

//! Storage seam for the service layer.
//!
//! Every method maps to one query or one transaction. Multi-step writes that
//! carry a derived side effect (like + notification, comment + notification,
//! toggles) are single methods so each backend can make them atomic.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;

use crate::error::SocialResult;
use crate::models::{
    AuthorSummary, Comment, CommentId, CommentView, LikeToggle, NewComment, NewFollow, NewLike,
    NewPost, NewUser, Notification, NotificationId, NotificationView, Post, PostId, PostPage,
    PostQuery, ProfileCounts, User, UserChanges, UserId,
};

#[async_trait]
pub trait SocialStore: Send + Sync {
    /// Cheap liveness check of the backend
    async fn ping(&self) -> SocialResult<()>;

    // Users

    async fn find_user(&self, id: UserId) -> SocialResult<Option<User>>;

    async fn find_user_by_external_id(&self, external_id: &str) -> SocialResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> SocialResult<Option<User>>;

    /// Insert a user. Fails with `Conflict` on a duplicate external id or username.
    async fn insert_user(&self, user: NewUser) -> SocialResult<User>;

    async fn update_user(&self, id: UserId, changes: UserChanges) -> SocialResult<User>;

    /// Case-insensitive substring match on usernames, ordered by lowercased
    /// username. `needle` is matched literally.
    async fn search_users(&self, needle: &str, limit: i64) -> SocialResult<Vec<AuthorSummary>>;

    async fn profile_counts(&self, id: UserId) -> SocialResult<ProfileCounts>;

    // Social graph

    async fn follow_exists(&self, follower: UserId, following: UserId) -> SocialResult<bool>;

    /// Remove the edge if present, otherwise insert it. Returns whether the
    /// follower follows the target afterwards.
    async fn toggle_follow(&self, follow: NewFollow) -> SocialResult<bool>;

    // Content

    async fn insert_post(&self, post: NewPost) -> SocialResult<Post>;

    async fn find_post(&self, id: PostId) -> SocialResult<Option<Post>>;

    /// Delete a post along with its comments, likes and notifications
    async fn delete_post(&self, id: PostId) -> SocialResult<bool>;

    /// Insert a comment and, unless `recipient` wrote it, a COMMENT
    /// notification for `recipient`, in one transaction. The comment comes
    /// back with its author attached.
    async fn create_comment(
        &self,
        comment: NewComment,
        recipient: UserId,
    ) -> SocialResult<(CommentView, Option<Notification>)>;

    async fn find_comment(&self, id: CommentId) -> SocialResult<Option<Comment>>;

    async fn delete_comment(&self, id: CommentId) -> SocialResult<bool>;

    /// Remove the like if present, otherwise insert it together with a LIKE
    /// notification for `recipient`, in one transaction.
    async fn toggle_like(&self, like: NewLike, recipient: UserId) -> SocialResult<LikeToggle>;

    async fn like_count(&self, post_id: PostId) -> SocialResult<i64>;

    // Feed

    /// One page of posts, newest first, with their like counts, liker ids
    /// and comments. Rows and details come from the same snapshot.
    async fn feed_page(&self, query: &PostQuery) -> SocialResult<PostPage>;

    /// A single post read the same way as a feed page; no rows when absent
    async fn post_page(&self, id: PostId) -> SocialResult<PostPage>;

    // Notifications

    async fn list_notifications(&self, user_id: UserId) -> SocialResult<Vec<NotificationView>>;

    /// Mark the given notifications of `user_id` as read; returns rows updated
    async fn mark_notifications_read(
        &self,
        user_id: UserId,
        ids: &[NotificationId],
    ) -> SocialResult<usize>;

    async fn unread_notifications(&self, user_id: UserId) -> SocialResult<i64>;
}

/// Escape LIKE wildcards so user input is matched literally
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
