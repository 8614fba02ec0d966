// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use tracing::debug;

use super::SocialService;
use crate::error::{SocialError, SocialResult};
use crate::models::{FeedCursor, FeedFilter, PostId, PostQuery, PostView, UserId};
use crate::store::SocialStore;

/// A restartable, lazily evaluated feed.
///
/// Nothing is read until the stream returned by [`Feed::stream`] is polled.
/// Each call to `stream` starts again from the newest post.
#[derive(Clone)]
pub struct Feed {
    store: Arc<dyn SocialStore>,
    viewer: Option<UserId>,
    filter: FeedFilter,
    page_size: i64,
}

struct PageState {
    feed: Feed,
    after: Option<FeedCursor>,
    exhausted: bool,
}

impl Feed {
    /// Post views in `(created_at DESC, id DESC)` order. A failed page ends
    /// the stream after yielding its error.
    pub fn stream(&self) -> BoxStream<'static, SocialResult<PostView>> {
        let start = PageState {
            feed: self.clone(),
            after: None,
            exhausted: false,
        };

        stream::unfold(start, |mut state| async move {
            if state.exhausted {
                return None;
            }
            match state.feed.load_page(state.after).await {
                Ok((views, next)) if !views.is_empty() => {
                    state.exhausted = next.is_none();
                    state.after = next;
                    Some((views.into_iter().map(Ok).collect::<Vec<_>>(), state))
                }
                Ok(_) => None,
                Err(e) => {
                    state.exhausted = true;
                    Some((vec![Err(e)], state))
                }
            }
        })
        .flat_map(stream::iter)
        .boxed()
    }

    /// Load one page and the cursor for the next one (`None` on the last page)
    async fn load_page(
        &self,
        after: Option<FeedCursor>,
    ) -> SocialResult<(Vec<PostView>, Option<FeedCursor>)> {
        let page = self
            .store
            .feed_page(&PostQuery {
                filter: self.filter,
                after,
                limit: self.page_size,
            })
            .await?;
        debug!("Loaded feed page of {} post(s) after {:?}", page.rows.len(), after);

        let next = page.next_cursor(self.page_size);
        Ok((page.into_views(self.viewer), next))
    }
}

impl SocialService {
    /// Lazy feed handle over `filter`, with viewer state derived for `viewer`
    pub fn feed(&self, viewer: Option<UserId>, filter: FeedFilter) -> Feed {
        Feed {
            store: self.store.clone(),
            viewer,
            filter,
            page_size: self.feed_page_size,
        }
    }

    /// The first `limit` posts of the global feed
    pub async fn get_feed(
        &self,
        viewer: Option<UserId>,
        limit: usize,
    ) -> SocialResult<Vec<PostView>> {
        self.collect_feed(viewer, FeedFilter::All, limit).await
    }

    pub async fn collect_feed(
        &self,
        viewer: Option<UserId>,
        filter: FeedFilter,
        limit: usize,
    ) -> SocialResult<Vec<PostView>> {
        self.feed(viewer, filter)
            .stream()
            .take(limit)
            .try_collect()
            .await
    }

    /// Single post with the same shape as a feed entry; `None` when absent
    pub async fn get_post_by_id(
        &self,
        viewer: Option<UserId>,
        post_id: PostId,
    ) -> SocialResult<Option<PostView>> {
        let page = self.store.post_page(post_id).await?;
        Ok(page.into_views(viewer).pop())
    }

    /// Posts written by the user with `username`
    pub async fn get_user_posts(
        &self,
        viewer: Option<UserId>,
        username: &str,
        limit: usize,
    ) -> SocialResult<Vec<PostView>> {
        let user = self.user_by_username(username).await?;
        self.collect_feed(viewer, FeedFilter::Author(user), limit).await
    }

    /// Posts liked by the user with `username`
    pub async fn get_liked_posts(
        &self,
        viewer: Option<UserId>,
        username: &str,
        limit: usize,
    ) -> SocialResult<Vec<PostView>> {
        let user = self.user_by_username(username).await?;
        self.collect_feed(viewer, FeedFilter::LikedBy(user), limit).await
    }

    async fn user_by_username(&self, username: &str) -> SocialResult<UserId> {
        self.store
            .find_user_by_username(username)
            .await?
            .map(|u| u.id)
            .ok_or_else(|| SocialError::NotFound("user".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::content::CreatePostRequest;
    use crate::service::testing::{service, user};

    async fn post(service: &SocialService, author: UserId, content: &str) -> PostId {
        service
            .create_post(
                Some(author),
                CreatePostRequest {
                    content: content.to_string(),
                    image: Some(format!("https://img.example/{content}.png")),
                },
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn feed_is_newest_first_across_pages() {
        // page size is 2 in the test service, so five posts span three pages
        let service = service();
        let alice = user(&service, "alice").await;
        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(post(&service, alice, &format!("p{i}")).await);
        }

        let feed = service.get_feed(None, 100).await.unwrap();
        let got: Vec<PostId> = feed.iter().map(|p| p.id).collect();
        ids.reverse();
        assert_eq!(got, ids);
    }

    #[tokio::test]
    async fn stream_is_lazy_and_restartable() {
        let service = service();
        let alice = user(&service, "alice").await;
        let handle = service.feed(None, FeedFilter::All);

        // created before any polling, still observed
        let first = post(&service, alice, "a").await;
        let second = post(&service, alice, "b").await;

        let run1: Vec<PostView> = handle.stream().try_collect().await.unwrap();
        let run2: Vec<PostView> = handle.stream().try_collect().await.unwrap();
        assert_eq!(run1, run2);
        assert_eq!(run1.iter().map(|p| p.id).collect::<Vec<_>>(), vec![second, first]);
    }

    #[tokio::test]
    async fn limit_truncates_the_feed() {
        let service = service();
        let alice = user(&service, "alice").await;
        for i in 0..3 {
            post(&service, alice, &format!("p{i}")).await;
        }
        assert_eq!(service.get_feed(None, 1).await.unwrap().len(), 1);
        assert!(service.get_feed(None, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn feed_and_single_post_agree() {
        let service = service();
        let alice = user(&service, "alice").await;
        let bob = user(&service, "bob").await;
        let carol = user(&service, "carol").await;

        let liked = post(&service, alice, "liked").await;
        let quiet = post(&service, bob, "quiet").await;
        service.toggle_like(Some(bob), liked).await.unwrap();
        service.toggle_like(Some(carol), liked).await.unwrap();
        service.create_comment(Some(carol), liked, "first!").await.unwrap();
        service.create_comment(Some(bob), liked, "second").await.unwrap();

        let feed = service.get_feed(Some(bob), 10).await.unwrap();
        for id in [liked, quiet] {
            let from_feed = feed.iter().find(|p| p.id == id).unwrap();
            let single = service.get_post_by_id(Some(bob), id).await.unwrap().unwrap();
            assert_eq!(from_feed, &single);
        }

        let view = feed.iter().find(|p| p.id == liked).unwrap();
        assert_eq!(view.like_count, 2);
        assert!(view.liked_by_viewer);
        assert_eq!(view.likes, vec![bob, carol]);
        let contents: Vec<&str> = view.comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["first!", "second"]);
    }

    #[tokio::test]
    async fn missing_post_is_none_not_error() {
        let service = service();
        assert_eq!(service.get_post_by_id(None, 42).await, Ok(None));
    }

    #[tokio::test]
    async fn profile_feeds_filter_by_author_and_likes() {
        let service = service();
        let alice = user(&service, "alice").await;
        let bob = user(&service, "bob").await;
        let a1 = post(&service, alice, "a1").await;
        let b1 = post(&service, bob, "b1").await;
        let a2 = post(&service, alice, "a2").await;
        service.toggle_like(Some(bob), a1).await.unwrap();
        service.toggle_like(Some(bob), b1).await.unwrap();

        let alice_posts = service.get_user_posts(None, "alice", 10).await.unwrap();
        assert_eq!(alice_posts.iter().map(|p| p.id).collect::<Vec<_>>(), vec![a2, a1]);

        let bob_likes = service.get_liked_posts(None, "bob", 10).await.unwrap();
        assert_eq!(bob_likes.iter().map(|p| p.id).collect::<Vec<_>>(), vec![b1, a1]);

        assert!(matches!(
            service.get_user_posts(None, "nobody", 10).await,
            Err(SocialError::NotFound(_))
        ));
    }
}
