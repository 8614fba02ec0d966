// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::SocialStore;
use crate::error::{SocialError, SocialResult};
use crate::models::{
    AuthorSummary, Comment, CommentId, CommentSummary, CommentView, FeedFilter, Follow, Like,
    LikeToggle, NewComment, NewFollow, NewLike, NewNotification, NewPost, NewUser, Notification,
    NotificationId, NotificationKind, NotificationView, Post, PostDetails, PostId, PostPage,
    PostQuery, PostSummary, ProfileCounts, User, UserChanges, UserId,
};

/// In-process store with the same constraints as the SQL schema: unique
/// usernames and external ids, unique like and follow pairs, no self-follow,
/// and cascading deletes from posts and comments.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    users: BTreeMap<UserId, User>,
    posts: BTreeMap<PostId, Post>,
    comments: BTreeMap<CommentId, Comment>,
    likes: BTreeMap<i32, Like>,
    follows: BTreeMap<i32, Follow>,
    notifications: BTreeMap<NotificationId, Notification>,
    last_id: i32,
}

impl MemoryState {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn author(&self, id: UserId) -> SocialResult<AuthorSummary> {
        self.users
            .get(&id)
            .map(AuthorSummary::from)
            .ok_or_else(|| SocialError::Persistence(format!("dangling user reference {}", id)))
    }

    fn insert_notification(&mut self, new: NewNotification) -> SocialResult<Notification> {
        if !self.users.contains_key(&new.user_id) || !self.users.contains_key(&new.actor_id) {
            return Err(SocialError::Persistence("notification references unknown user".into()));
        }
        let id = self.next_id();
        let notification = Notification {
            id,
            user_id: new.user_id,
            actor_id: new.actor_id,
            kind: new.kind,
            post_id: new.post_id,
            comment_id: new.comment_id,
            read: new.read,
            created_at: new.created_at,
        };
        self.notifications.insert(id, notification.clone());
        Ok(notification)
    }

    fn like_position(&self, user_id: UserId, post_id: PostId) -> Option<i32> {
        self.likes
            .values()
            .find(|l| l.user_id == user_id && l.post_id == post_id)
            .map(|l| l.id)
    }

    fn follow_position(&self, follower: UserId, following: UserId) -> Option<i32> {
        self.follows
            .values()
            .find(|f| f.follower_id == follower && f.following_id == following)
            .map(|f| f.id)
    }

    fn post_rows(&self, query: &PostQuery) -> SocialResult<Vec<(Post, AuthorSummary)>> {
        let mut selected: Vec<&Post> = self
            .posts
            .values()
            .filter(|p| match query.filter {
                FeedFilter::All => true,
                FeedFilter::Author(author_id) => p.author_id == author_id,
                FeedFilter::LikedBy(user_id) => self.like_position(user_id, p.id).is_some(),
            })
            .filter(|p| query.after.map_or(true, |cursor| cursor.precedes(p)))
            .collect();
        selected.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        selected
            .into_iter()
            .take(query.limit.max(0) as usize)
            .map(|p| -> SocialResult<(Post, AuthorSummary)> {
                Ok((p.clone(), self.author(p.author_id)?))
            })
            .collect()
    }

    fn post_details(&self, post_ids: &[PostId]) -> SocialResult<PostDetails> {
        let mut counts: HashMap<PostId, i64> = HashMap::new();
        let mut likes: Vec<&Like> = self
            .likes
            .values()
            .filter(|l| post_ids.contains(&l.post_id))
            .collect();
        likes.sort_by_key(|l| (l.post_id, l.created_at, l.id));
        for like in &likes {
            *counts.entry(like.post_id).or_default() += 1;
        }

        let mut comments: Vec<&Comment> = self
            .comments
            .values()
            .filter(|c| post_ids.contains(&c.post_id))
            .collect();
        comments.sort_by_key(|c| (c.created_at, c.id));
        let comment_rows = comments
            .into_iter()
            .map(|c| -> SocialResult<(Comment, AuthorSummary)> {
                Ok((c.clone(), self.author(c.author_id)?))
            })
            .collect::<SocialResult<Vec<_>>>()?;

        Ok(PostDetails::from_rows(
            counts.into_iter().collect(),
            likes.into_iter().map(|l| (l.post_id, l.user_id)).collect(),
            comment_rows,
        ))
    }

    fn remove_comment_cascade(&mut self, id: CommentId) -> bool {
        let removed = self.comments.remove(&id).is_some();
        if removed {
            self.notifications.retain(|_, n| n.comment_id != Some(id));
        }
        removed
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SocialStore for MemoryStore {
    async fn ping(&self) -> SocialResult<()> {
        let _state = self.state.read().await;
        Ok(())
    }

    async fn find_user(&self, id: UserId) -> SocialResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_external_id(&self, external_id: &str) -> SocialResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.external_id == external_id)
            .cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> SocialResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> SocialResult<User> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.external_id == user.external_id) {
            return Err(SocialError::Conflict("external_id already registered".into()));
        }
        if state.users.values().any(|u| u.username == user.username) {
            return Err(SocialError::Conflict(format!("username {} is taken", user.username)));
        }

        let id = state.next_id();
        let created = User {
            id,
            external_id: user.external_id,
            email: user.email,
            username: user.username,
            name: user.name,
            bio: None,
            website: None,
            location: None,
            image: user.image,
            created_at: user.created_at,
            updated_at: user.updated_at,
        };
        state.users.insert(id, created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: UserId, changes: UserChanges) -> SocialResult<User> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| SocialError::NotFound("user".to_string()))?;
        user.name = changes.name;
        user.bio = changes.bio;
        user.website = changes.website;
        user.location = changes.location;
        user.updated_at = changes.updated_at;
        Ok(user.clone())
    }

    async fn search_users(&self, needle: &str, limit: i64) -> SocialResult<Vec<AuthorSummary>> {
        let needle = needle.to_lowercase();
        let state = self.state.read().await;
        let mut found: Vec<AuthorSummary> = state
            .users
            .values()
            .filter(|u| u.username.to_lowercase().contains(&needle))
            .map(AuthorSummary::from)
            .collect();
        found.sort_by_cached_key(|u| (u.username.to_lowercase(), u.username.clone()));
        found.truncate(limit.max(0) as usize);
        Ok(found)
    }

    async fn profile_counts(&self, id: UserId) -> SocialResult<ProfileCounts> {
        let state = self.state.read().await;
        Ok(ProfileCounts {
            followers: state.follows.values().filter(|f| f.following_id == id).count() as i64,
            following: state.follows.values().filter(|f| f.follower_id == id).count() as i64,
            posts: state.posts.values().filter(|p| p.author_id == id).count() as i64,
        })
    }

    async fn follow_exists(&self, follower: UserId, following: UserId) -> SocialResult<bool> {
        let state = self.state.read().await;
        Ok(state.follow_position(follower, following).is_some())
    }

    async fn toggle_follow(&self, follow: NewFollow) -> SocialResult<bool> {
        if follow.follower_id == follow.following_id {
            return Err(SocialError::Validation("users cannot follow themselves".into()));
        }
        let mut state = self.state.write().await;
        if let Some(id) = state.follow_position(follow.follower_id, follow.following_id) {
            state.follows.remove(&id);
            return Ok(false);
        }
        if !state.users.contains_key(&follow.follower_id)
            || !state.users.contains_key(&follow.following_id)
        {
            return Err(SocialError::Persistence("follow references unknown user".into()));
        }
        let id = state.next_id();
        state.follows.insert(
            id,
            Follow {
                id,
                follower_id: follow.follower_id,
                following_id: follow.following_id,
                created_at: follow.created_at,
            },
        );
        Ok(true)
    }

    async fn insert_post(&self, post: NewPost) -> SocialResult<Post> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&post.author_id) {
            return Err(SocialError::Persistence("post references unknown author".into()));
        }
        let id = state.next_id();
        let created = Post {
            id,
            author_id: post.author_id,
            content: post.content,
            image: post.image,
            created_at: post.created_at,
            updated_at: post.updated_at,
        };
        state.posts.insert(id, created.clone());
        Ok(created)
    }

    async fn find_post(&self, id: PostId) -> SocialResult<Option<Post>> {
        Ok(self.state.read().await.posts.get(&id).cloned())
    }

    async fn delete_post(&self, id: PostId) -> SocialResult<bool> {
        let mut state = self.state.write().await;
        if state.posts.remove(&id).is_none() {
            return Ok(false);
        }
        let comment_ids: Vec<CommentId> = state
            .comments
            .values()
            .filter(|c| c.post_id == id)
            .map(|c| c.id)
            .collect();
        for comment_id in comment_ids {
            state.remove_comment_cascade(comment_id);
        }
        state.likes.retain(|_, l| l.post_id != id);
        state.notifications.retain(|_, n| n.post_id != Some(id));
        Ok(true)
    }

    async fn create_comment(
        &self,
        comment: NewComment,
        recipient: UserId,
    ) -> SocialResult<(CommentView, Option<Notification>)> {
        let mut state = self.state.write().await;
        if !state.posts.contains_key(&comment.post_id) {
            return Err(SocialError::NotFound("post".to_string()));
        }
        if !state.users.contains_key(&comment.author_id) {
            return Err(SocialError::Persistence("comment references unknown author".into()));
        }

        let new_notification = NewNotification::for_interaction(
            NotificationKind::Comment,
            recipient,
            comment.author_id,
            Some(comment.post_id),
            None,
            comment.created_at,
        );
        if let Some(n) = &new_notification {
            if !state.users.contains_key(&n.user_id) {
                return Err(SocialError::Persistence("notification references unknown user".into()));
            }
        }

        let id = state.next_id();
        let created = Comment {
            id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            content: comment.content,
            created_at: comment.created_at,
        };
        state.comments.insert(id, created.clone());

        let notification = match new_notification {
            Some(mut n) => {
                n.comment_id = Some(id);
                Some(state.insert_notification(n)?)
            }
            None => None,
        };
        let author = state.author(created.author_id)?;
        Ok((CommentView::new(created, author), notification))
    }

    async fn find_comment(&self, id: CommentId) -> SocialResult<Option<Comment>> {
        Ok(self.state.read().await.comments.get(&id).cloned())
    }

    async fn delete_comment(&self, id: CommentId) -> SocialResult<bool> {
        Ok(self.state.write().await.remove_comment_cascade(id))
    }

    async fn toggle_like(&self, like: NewLike, recipient: UserId) -> SocialResult<LikeToggle> {
        let mut state = self.state.write().await;
        if let Some(id) = state.like_position(like.user_id, like.post_id) {
            state.likes.remove(&id);
            return Ok(LikeToggle {
                liked: false,
                notification: None,
            });
        }
        if !state.posts.contains_key(&like.post_id) || !state.users.contains_key(&like.user_id) {
            return Err(SocialError::Persistence("like references unknown row".into()));
        }

        // Validate the notification before touching anything so the pair stays atomic
        let new_notification = NewNotification::for_interaction(
            NotificationKind::Like,
            recipient,
            like.user_id,
            Some(like.post_id),
            None,
            like.created_at,
        );
        if let Some(n) = &new_notification {
            if !state.users.contains_key(&n.user_id) {
                return Err(SocialError::Persistence("notification references unknown user".into()));
            }
        }

        let id = state.next_id();
        state.likes.insert(
            id,
            Like {
                id,
                user_id: like.user_id,
                post_id: like.post_id,
                created_at: like.created_at,
            },
        );
        let notification = match new_notification {
            Some(n) => Some(state.insert_notification(n)?),
            None => None,
        };
        Ok(LikeToggle {
            liked: true,
            notification,
        })
    }

    async fn like_count(&self, post_id: PostId) -> SocialResult<i64> {
        let state = self.state.read().await;
        Ok(state.likes.values().filter(|l| l.post_id == post_id).count() as i64)
    }

    async fn feed_page(&self, query: &PostQuery) -> SocialResult<PostPage> {
        let state = self.state.read().await;
        let rows = state.post_rows(query)?;
        let details = state.post_details(&PostPage::post_ids(&rows))?;
        Ok(PostPage { rows, details })
    }

    async fn post_page(&self, id: PostId) -> SocialResult<PostPage> {
        let state = self.state.read().await;
        let rows = match state.posts.get(&id) {
            Some(post) => vec![(post.clone(), state.author(post.author_id)?)],
            None => Vec::new(),
        };
        let details = state.post_details(&PostPage::post_ids(&rows))?;
        Ok(PostPage { rows, details })
    }

    async fn list_notifications(&self, user_id: UserId) -> SocialResult<Vec<NotificationView>> {
        let state = self.state.read().await;
        let mut mine: Vec<&Notification> = state
            .notifications
            .values()
            .filter(|n| n.user_id == user_id)
            .collect();
        mine.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        mine.into_iter()
            .map(|n| -> SocialResult<NotificationView> {
                let post = n.post_id.and_then(|id| state.posts.get(&id)).map(|p| PostSummary {
                    id: p.id,
                    content: p.content.clone(),
                    image: p.image.clone(),
                });
                let comment = n
                    .comment_id
                    .and_then(|id| state.comments.get(&id))
                    .map(|c| CommentSummary {
                        id: c.id,
                        content: c.content.clone(),
                        created_at: c.created_at,
                    });
                NotificationView::new(n.clone(), state.author(n.actor_id)?, post, comment)
            })
            .collect()
    }

    async fn mark_notifications_read(
        &self,
        user_id: UserId,
        ids: &[NotificationId],
    ) -> SocialResult<usize> {
        let mut state = self.state.write().await;
        let mut updated = 0;
        for id in ids {
            if let Some(n) = state.notifications.get_mut(id) {
                if n.user_id == user_id {
                    n.read = true;
                    updated += 1;
                }
            }
        }
        Ok(updated)
    }

    async fn unread_notifications(&self, user_id: UserId) -> SocialResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && !n.read)
            .count() as i64)
    }
}
