// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use tracing::{debug, info};

use super::{clean_text, now, require_viewer, SocialService};
use crate::error::{SocialError, SocialResult};
use crate::models::{
    AuthorSummary, FollowState, NewFollow, ProfileUpdate, ProfileView, User, UserChanges, UserId,
};

pub const MAX_BIO_CHARS: usize = 160;
pub const MAX_FIELD_CHARS: usize = 100;
pub const SEARCH_LIMIT: i64 = 10;

/// Blank clears the website; a missing scheme defaults to https
fn normalize_website(input: Option<&str>) -> SocialResult<Option<String>> {
    let website = match clean_text("website", input, MAX_FIELD_CHARS)? {
        Some(w) => w,
        None => return Ok(None),
    };
    if website.chars().any(char::is_whitespace) {
        return Err(SocialError::Validation("website must not contain spaces".to_string()));
    }
    if website.starts_with("http://") || website.starts_with("https://") {
        Ok(Some(website))
    } else {
        Ok(Some(format!("https://{}", website)))
    }
}

impl SocialService {
    /// Profile page data for `username`; `None` when no such user
    pub async fn get_profile(
        &self,
        viewer: Option<UserId>,
        username: &str,
    ) -> SocialResult<Option<ProfileView>> {
        let user = match self.store.find_user_by_username(username).await? {
            Some(user) => user,
            None => {
                debug!("Profile not found with username: {}", username);
                return Ok(None);
            }
        };

        let counts = self.store.profile_counts(user.id).await?;
        let is_following = match viewer {
            Some(v) if v != user.id => self.store.follow_exists(v, user.id).await?,
            _ => false,
        };
        Ok(Some(ProfileView::new(user, counts, is_following)))
    }

    /// Follow `target` if the viewer does not already, unfollow otherwise
    pub async fn toggle_follow(
        &self,
        viewer: Option<UserId>,
        target: UserId,
    ) -> SocialResult<FollowState> {
        let actor = require_viewer(viewer)?;
        if actor == target {
            return Err(SocialError::Validation("users cannot follow themselves".to_string()));
        }
        if self.store.find_user(target).await?.is_none() {
            return Err(SocialError::NotFound("user".to_string()));
        }

        let following = self
            .store
            .toggle_follow(NewFollow {
                follower_id: actor,
                following_id: target,
                created_at: now(),
            })
            .await?;
        info!(
            "User {} {} user {}",
            actor,
            if following { "followed" } else { "unfollowed" },
            target
        );
        Ok(FollowState {
            user_id: target,
            following,
        })
    }

    /// Whether the viewer follows `target`; anonymous viewers follow nobody
    pub async fn is_following(&self, viewer: Option<UserId>, target: UserId) -> SocialResult<bool> {
        match viewer {
            Some(actor) => self.store.follow_exists(actor, target).await,
            None => Ok(false),
        }
    }

    pub async fn update_profile(
        &self,
        viewer: Option<UserId>,
        update: ProfileUpdate,
    ) -> SocialResult<User> {
        let user_id = require_viewer(viewer)?;
        let changes = UserChanges {
            name: clean_text("name", update.name.as_deref(), MAX_FIELD_CHARS)?,
            bio: clean_text("bio", update.bio.as_deref(), MAX_BIO_CHARS)?,
            website: normalize_website(update.website.as_deref())?,
            location: clean_text("location", update.location.as_deref(), MAX_FIELD_CHARS)?,
            updated_at: now(),
        };
        let user = self.store.update_user(user_id, changes).await?;
        info!("User {} updated their profile", user_id);
        Ok(user)
    }

    /// Case-insensitive username search for signed-in users
    pub async fn search_users(
        &self,
        viewer: Option<UserId>,
        query: &str,
    ) -> SocialResult<Vec<AuthorSummary>> {
        let query = query.trim();
        if viewer.is_none() || query.is_empty() {
            return Ok(Vec::new());
        }
        self.store.search_users(query, SEARCH_LIMIT).await
    }
}
