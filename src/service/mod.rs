// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

//! Service operations. Each takes the caller's identity explicitly and talks
//! to storage only through [`SocialStore`].

mod content;
mod feed;
mod graph;
mod identity;
mod notifications;

pub use content::{CreatePostRequest, MAX_COMMENT_CHARS, MAX_POST_CHARS};
pub use feed::Feed;
pub use graph::{MAX_BIO_CHARS, SEARCH_LIMIT};
pub use identity::{SessionIdentity, MAX_USERNAME_SUFFIX};

use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};

use crate::error::{SocialError, SocialResult};
use crate::models::UserId;
use crate::store::SocialStore;

/// Entry point for every social operation
#[derive(Clone)]
pub struct SocialService {
    store: Arc<dyn SocialStore>,
    feed_page_size: i64,
}

impl SocialService {
    pub fn new(store: Arc<dyn SocialStore>, feed_page_size: i64) -> Self {
        Self {
            store,
            feed_page_size: feed_page_size.max(1),
        }
    }

    pub fn store(&self) -> &Arc<dyn SocialStore> {
        &self.store
    }

    pub async fn ping(&self) -> SocialResult<()> {
        self.store.ping().await
    }
}

/// The resolved local user behind a request, or fail with `Unauthenticated`
pub(crate) fn require_viewer(viewer: Option<UserId>) -> SocialResult<UserId> {
    viewer.ok_or(SocialError::Unauthenticated)
}

pub(crate) fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Trim `input`, map blank to `None`, and enforce a character limit
pub(crate) fn clean_text(
    field: &str,
    input: Option<&str>,
    max_chars: usize,
) -> SocialResult<Option<String>> {
    let trimmed = match input.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return Ok(None),
    };
    if trimmed.chars().count() > max_chars {
        return Err(SocialError::Validation(format!(
            "{} must be at most {} characters",
            field, max_chars
        )));
    }
    Ok(Some(trimmed.to_string()))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::store::MemoryStore;

    pub fn service() -> SocialService {
        SocialService::new(Arc::new(MemoryStore::new()), 2)
    }

    pub fn session(external_id: &str, username: &str) -> SessionIdentity {
        SessionIdentity {
            external_id: external_id.to_string(),
            email: Some(format!("{}@example.com", username)),
            first_name: Some(username.to_string()),
            last_name: None,
            username: Some(username.to_string()),
            image_url: None,
        }
    }

    pub async fn user(service: &SocialService, username: &str) -> UserId {
        let session = session(&format!("ext-{}", username), username);
        service
            .resolve_current_user(Some(&session))
            .await
            .unwrap()
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_trims_and_limits() {
        assert_eq!(clean_text("bio", Some("  hi "), 10).unwrap(), Some("hi".to_string()));
        assert_eq!(clean_text("bio", Some("   "), 10).unwrap(), None);
        assert_eq!(clean_text("bio", None, 10).unwrap(), None);
        assert!(matches!(
            clean_text("bio", Some("abcdef"), 3),
            Err(SocialError::Validation(_))
        ));
    }

    #[test]
    fn missing_viewer_is_unauthenticated() {
        assert_eq!(require_viewer(None), Err(SocialError::Unauthenticated));
        assert_eq!(require_viewer(Some(3)), Ok(3));
    }
}
