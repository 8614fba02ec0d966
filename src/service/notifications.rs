// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use tracing::{debug, info};

use super::{require_viewer, SocialService};
use crate::error::SocialResult;
use crate::models::{NotificationId, NotificationView, UserId};

impl SocialService {
    /// The viewer's notifications, newest first. Anonymous viewers get none.
    pub async fn list_notifications(
        &self,
        viewer: Option<UserId>,
    ) -> SocialResult<Vec<NotificationView>> {
        match viewer {
            Some(user_id) => self.store.list_notifications(user_id).await,
            None => Ok(Vec::new()),
        }
    }

    /// Mark notifications as read. Only the viewer's own rows are touched;
    /// an empty id list returns immediately without reaching storage.
    pub async fn mark_notifications_read(
        &self,
        viewer: Option<UserId>,
        ids: &[NotificationId],
    ) -> SocialResult<usize> {
        if ids.is_empty() {
            debug!("No notifications to mark as read");
            return Ok(0);
        }
        let user_id = require_viewer(viewer)?;
        let updated = self.store.mark_notifications_read(user_id, ids).await?;
        info!("Marked {} notification(s) read for user {}", updated, user_id);
        Ok(updated)
    }

    pub async fn unread_count(&self, viewer: Option<UserId>) -> SocialResult<i64> {
        match viewer {
            Some(user_id) => self.store.unread_notifications(user_id).await,
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SocialError;
    use crate::service::content::CreatePostRequest;
    use crate::service::testing::{service, user};

    async fn liked_post(service: &SocialService, author: UserId, likers: &[UserId]) {
        let post = service
            .create_post(
                Some(author),
                CreatePostRequest {
                    content: "photo".into(),
                    image: Some("https://x/photo.png".into()),
                },
            )
            .await
            .unwrap();
        for liker in likers {
            service.toggle_like(Some(*liker), post.id).await.unwrap();
        }
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn empty_mark_read_is_a_noop_even_anonymously() {
        let service = service();
        assert_eq!(service.mark_notifications_read(None, &[]).await, Ok(0));
        assert!(logs_contain("No notifications to mark as read"));
    }

    #[tokio::test]
    async fn notifications_are_newest_first_and_marked_read() {
        let service = service();
        let alice = user(&service, "alice").await;
        let bob = user(&service, "bob").await;
        let carol = user(&service, "carol").await;
        liked_post(&service, alice, &[bob, carol]).await;

        let inbox = service.list_notifications(Some(alice)).await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].actor.id, carol);
        assert_eq!(inbox[1].actor.id, bob);
        assert_eq!(service.unread_count(Some(alice)).await.unwrap(), 2);

        let updated = service
            .mark_notifications_read(Some(alice), &[inbox[0].id])
            .await
            .unwrap();
        assert_eq!(updated, 1);
        assert_eq!(service.unread_count(Some(alice)).await.unwrap(), 1);
        let inbox = service.list_notifications(Some(alice)).await.unwrap();
        assert!(inbox[0].read);
        assert!(!inbox[1].read);
    }

    #[tokio::test]
    async fn cannot_mark_someone_elses_notifications() {
        let service = service();
        let alice = user(&service, "alice").await;
        let bob = user(&service, "bob").await;
        liked_post(&service, alice, &[bob]).await;
        let ids: Vec<NotificationId> = service
            .list_notifications(Some(alice))
            .await
            .unwrap()
            .iter()
            .map(|n| n.id)
            .collect();

        assert_eq!(service.mark_notifications_read(Some(bob), &ids).await, Ok(0));
        assert_eq!(
            service.mark_notifications_read(None, &ids).await,
            Err(SocialError::Unauthenticated)
        );
        assert_eq!(service.unread_count(Some(alice)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn anonymous_inbox_is_empty() {
        let service = service();
        assert!(service.list_notifications(None).await.unwrap().is_empty());
        assert_eq!(service.unread_count(None).await, Ok(0));
    }
}
