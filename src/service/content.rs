// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use serde::Deserialize;
use tracing::{debug, info};

use super::{clean_text, now, require_viewer, SocialService};
use crate::error::{SocialError, SocialResult};
use crate::models::{
    CommentId, CommentView, LikeState, NewComment, NewLike, NewPost, Post, PostId, UserId,
};

pub const MAX_POST_CHARS: usize = 2_000;
pub const MAX_COMMENT_CHARS: usize = 1_000;

/// Body of a create-post request. `image` is the URL handed back by the media host.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image: Option<String>,
}

fn validate_image_url(image: Option<&str>) -> SocialResult<Option<String>> {
    match image.map(str::trim).filter(|i| !i.is_empty()) {
        Some(url) if url.starts_with("https://") || url.starts_with("http://") => {
            Ok(Some(url.to_string()))
        }
        Some(_) => Err(SocialError::Validation(
            "image must be a URL returned by the media host".to_string(),
        )),
        None => Ok(None),
    }
}

impl SocialService {
    /// Publish a post. Both a caption and an image are required.
    pub async fn create_post(
        &self,
        viewer: Option<UserId>,
        request: CreatePostRequest,
    ) -> SocialResult<Post> {
        let author_id = require_viewer(viewer)?;

        let content = clean_text("content", Some(&request.content), MAX_POST_CHARS)?;
        let image = validate_image_url(request.image.as_deref())?;
        let (content, image) = match (content, image) {
            (Some(content), Some(image)) => (content, image),
            (None, None) => {
                return Err(SocialError::Validation("post is empty".to_string()))
            }
            (None, Some(_)) => {
                return Err(SocialError::Validation("a caption is required".to_string()))
            }
            (Some(_), None) => {
                return Err(SocialError::Validation("an image is required".to_string()))
            }
        };

        let at = now();
        let post = self
            .store
            .insert_post(NewPost {
                author_id,
                content,
                image: Some(image),
                created_at: at,
                updated_at: at,
            })
            .await?;
        info!("User {} created post {}", author_id, post.id);
        Ok(post)
    }

    /// Delete a post owned by the viewer, with its comments, likes and notifications
    pub async fn delete_post(&self, viewer: Option<UserId>, post_id: PostId) -> SocialResult<()> {
        let requester = require_viewer(viewer)?;

        let post = self
            .store
            .find_post(post_id)
            .await?
            .ok_or_else(|| SocialError::NotFound("post".to_string()))?;
        if post.author_id != requester {
            return Err(SocialError::Authorization(
                "only the author can delete this post".to_string(),
            ));
        }

        if !self.store.delete_post(post_id).await? {
            // Gone between the read and the delete; the outcome is the same
            debug!("Post {} was already deleted", post_id);
        }
        info!("User {} deleted post {}", requester, post_id);
        Ok(())
    }

    /// Comment on a post, notifying its author when the commenter is someone else
    pub async fn create_comment(
        &self,
        viewer: Option<UserId>,
        post_id: PostId,
        content: &str,
    ) -> SocialResult<CommentView> {
        let author_id = require_viewer(viewer)?;
        let content = clean_text("comment", Some(content), MAX_COMMENT_CHARS)?
            .ok_or_else(|| SocialError::Validation("comment is empty".to_string()))?;

        let post = self
            .store
            .find_post(post_id)
            .await?
            .ok_or_else(|| SocialError::NotFound("post".to_string()))?;

        let (comment, notification) = self
            .store
            .create_comment(
                NewComment {
                    post_id,
                    author_id,
                    content,
                    created_at: now(),
                },
                post.author_id,
            )
            .await?;

        info!(
            "User {} commented {} on post {} (notified: {})",
            author_id,
            comment.id,
            post_id,
            notification.is_some()
        );
        Ok(comment)
    }

    pub async fn delete_comment(
        &self,
        viewer: Option<UserId>,
        comment_id: CommentId,
    ) -> SocialResult<()> {
        let requester = require_viewer(viewer)?;

        let comment = self
            .store
            .find_comment(comment_id)
            .await?
            .ok_or_else(|| SocialError::NotFound("comment".to_string()))?;
        if comment.author_id != requester {
            return Err(SocialError::Authorization(
                "only the author can delete this comment".to_string(),
            ));
        }

        self.store.delete_comment(comment_id).await?;
        info!("User {} deleted comment {}", requester, comment_id);
        Ok(())
    }

    /// Like the post if the viewer has not, unlike it otherwise
    pub async fn toggle_like(
        &self,
        viewer: Option<UserId>,
        post_id: PostId,
    ) -> SocialResult<LikeState> {
        let user_id = require_viewer(viewer)?;

        let post = self
            .store
            .find_post(post_id)
            .await?
            .ok_or_else(|| SocialError::NotFound("post".to_string()))?;

        let toggle = self
            .store
            .toggle_like(
                NewLike {
                    user_id,
                    post_id,
                    created_at: now(),
                },
                post.author_id,
            )
            .await?;
        let like_count = self.store.like_count(post_id).await?;

        info!(
            "User {} {} post {} (notified: {})",
            user_id,
            if toggle.liked { "liked" } else { "unliked" },
            post_id,
            toggle.notification.is_some()
        );
        Ok(LikeState {
            post_id,
            liked: toggle.liked,
            like_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationKind;
    use crate::service::testing::{service, user};

    fn request(content: &str, image: Option<&str>) -> CreatePostRequest {
        CreatePostRequest {
            content: content.to_string(),
            image: image.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn anonymous_writes_are_rejected() {
        let service = service();
        let err = service
            .create_post(None, request("hello", Some("https://x/img.png")))
            .await
            .unwrap_err();
        assert_eq!(err, SocialError::Unauthenticated);
        assert_eq!(service.toggle_like(None, 1).await.unwrap_err(), SocialError::Unauthenticated);
    }

    #[tokio::test]
    async fn post_requires_caption_and_image() {
        let service = service();
        let alice = user(&service, "alice").await;

        for (content, image) in [("hello", None), ("   ", Some("https://x/img.png")), ("", None)] {
            let err = service
                .create_post(Some(alice), request(content, image))
                .await
                .unwrap_err();
            assert!(matches!(err, SocialError::Validation(_)), "{content:?} {image:?}");
        }

        let err = service
            .create_post(Some(alice), request("hello", Some("data:image/png;base64,AAAA")))
            .await
            .unwrap_err();
        assert!(matches!(err, SocialError::Validation(_)));

        let too_long = "x".repeat(MAX_POST_CHARS + 1);
        let err = service
            .create_post(Some(alice), request(&too_long, Some("https://x/img.png")))
            .await
            .unwrap_err();
        assert!(matches!(err, SocialError::Validation(_)));
    }

    #[tokio::test]
    async fn create_like_unlike_scenario() {
        let service = service();
        let alice = user(&service, "alice").await;
        let bob = user(&service, "bob").await;

        let rejected = service
            .create_post(Some(alice), request("hello", None))
            .await;
        assert!(matches!(rejected, Err(SocialError::Validation(_))));

        let post = service
            .create_post(Some(alice), request("hello", Some("https://x/img.png")))
            .await
            .unwrap();
        assert_eq!(post.content, "hello");

        let liked = service.toggle_like(Some(bob), post.id).await.unwrap();
        assert!(liked.liked);
        assert_eq!(liked.like_count, 1);

        let inbox = service.list_notifications(Some(alice)).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::Like);
        assert_eq!(inbox[0].actor.id, bob);

        let unliked = service.toggle_like(Some(bob), post.id).await.unwrap();
        assert!(!unliked.liked);
        assert_eq!(unliked.like_count, 0);
    }

    #[tokio::test]
    async fn toggling_twice_restores_state() {
        let service = service();
        let alice = user(&service, "alice").await;
        let bob = user(&service, "bob").await;
        let carol = user(&service, "carol").await;
        let post = service
            .create_post(Some(alice), request("pic", Some("https://x/1.png")))
            .await
            .unwrap();
        service.toggle_like(Some(carol), post.id).await.unwrap();

        for liker in [alice, bob] {
            let before = service.get_post_by_id(Some(liker), post.id).await.unwrap().unwrap();
            service.toggle_like(Some(liker), post.id).await.unwrap();
            service.toggle_like(Some(liker), post.id).await.unwrap();
            let after = service.get_post_by_id(Some(liker), post.id).await.unwrap().unwrap();
            assert_eq!(before.like_count, after.like_count);
            assert_eq!(before.liked_by_viewer, after.liked_by_viewer);
        }
    }

    #[tokio::test]
    async fn liking_own_post_does_not_notify() {
        let service = service();
        let alice = user(&service, "alice").await;
        let post = service
            .create_post(Some(alice), request("me", Some("https://x/me.png")))
            .await
            .unwrap();
        service.toggle_like(Some(alice), post.id).await.unwrap();
        assert!(service.list_notifications(Some(alice)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn comments_notify_only_other_authors() {
        let service = service();
        let alice = user(&service, "alice").await;
        let bob = user(&service, "bob").await;
        let post = service
            .create_post(Some(alice), request("hello", Some("https://x/img.png")))
            .await
            .unwrap();

        service.create_comment(Some(alice), post.id, "my own").await.unwrap();
        assert_eq!(service.list_notifications(Some(alice)).await.unwrap().len(), 0);

        let comment = service.create_comment(Some(bob), post.id, " nice ").await.unwrap();
        assert_eq!(comment.content, "nice");
        assert_eq!(comment.author.id, bob);
        assert_eq!(comment.author.username, "bob");
        let inbox = service.list_notifications(Some(alice)).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::Comment);
        assert_eq!(inbox[0].comment.as_ref().map(|c| c.id), Some(comment.id));
        assert_eq!(inbox[0].post.as_ref().map(|p| p.id), Some(post.id));
        assert!(service.list_notifications(Some(bob)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_comment_and_missing_post_are_rejected() {
        let service = service();
        let bob = user(&service, "bob").await;
        assert!(matches!(
            service.create_comment(Some(bob), 999, "hi").await,
            Err(SocialError::NotFound(_))
        ));
        assert!(matches!(
            service.create_comment(Some(bob), 999, "  ").await,
            Err(SocialError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn non_author_cannot_delete_post() {
        let service = service();
        let alice = user(&service, "alice").await;
        let bob = user(&service, "bob").await;
        let post = service
            .create_post(Some(alice), request("keep", Some("https://x/k.png")))
            .await
            .unwrap();
        service.create_comment(Some(bob), post.id, "first").await.unwrap();
        service.toggle_like(Some(bob), post.id).await.unwrap();
        let before = service.get_post_by_id(None, post.id).await.unwrap();

        let err = service.delete_post(Some(bob), post.id).await.unwrap_err();
        assert!(matches!(err, SocialError::Authorization(_)));

        let after = service.get_post_by_id(None, post.id).await.unwrap();
        assert_eq!(before, after);
        assert_eq!(service.list_notifications(Some(alice)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn author_delete_cascades() {
        let service = service();
        let alice = user(&service, "alice").await;
        let bob = user(&service, "bob").await;
        let post = service
            .create_post(Some(alice), request("bye", Some("https://x/b.png")))
            .await
            .unwrap();
        service.create_comment(Some(bob), post.id, "later").await.unwrap();
        service.toggle_like(Some(bob), post.id).await.unwrap();

        service.delete_post(Some(alice), post.id).await.unwrap();
        assert_eq!(service.get_post_by_id(None, post.id).await.unwrap(), None);
        assert!(service.list_notifications(Some(alice)).await.unwrap().is_empty());
        assert!(matches!(
            service.delete_post(Some(alice), post.id).await,
            Err(SocialError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn only_comment_author_can_delete_it() {
        let service = service();
        let alice = user(&service, "alice").await;
        let bob = user(&service, "bob").await;
        let post = service
            .create_post(Some(alice), request("p", Some("https://x/p.png")))
            .await
            .unwrap();
        let comment = service.create_comment(Some(bob), post.id, "c").await.unwrap();

        assert!(matches!(
            service.delete_comment(Some(alice), comment.id).await,
            Err(SocialError::Authorization(_))
        ));
        service.delete_comment(Some(bob), comment.id).await.unwrap();

        let view = service.get_post_by_id(None, post.id).await.unwrap().unwrap();
        assert!(view.comments.is_empty());
        assert!(service.list_notifications(Some(alice)).await.unwrap().is_empty());
    }
}
