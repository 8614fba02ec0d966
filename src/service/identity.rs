// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{now, SocialService};
use crate::error::{SocialError, SocialResult};
use crate::models::{NewUser, User, UserId};

/// Highest numeric suffix tried when a new account's username is taken
pub const MAX_USERNAME_SUFFIX: usize = 5;

/// Attributes the identity provider vouches for on an authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub external_id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub image_url: Option<String>,
}

impl SessionIdentity {
    /// Provider username, else the local part of the email, else a handle
    /// derived from the external id
    pub fn base_username(&self) -> String {
        let from_provider = self
            .username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty());
        let from_email = self
            .email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .map(str::trim)
            .filter(|u| !u.is_empty());

        match from_provider.or(from_email) {
            Some(name) => name.to_string(),
            None => {
                let suffix: String = self
                    .external_id
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .take(12)
                    .collect();
                format!("user_{}", suffix.to_lowercase())
            }
        }
    }

    pub fn display_name(&self) -> Option<String> {
        let full = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        let full = full.trim();
        if full.is_empty() {
            None
        } else {
            Some(full.to_string())
        }
    }

    fn new_user(&self, username: String, at: NaiveDateTime) -> NewUser {
        NewUser {
            external_id: self.external_id.clone(),
            email: self.email.clone().unwrap_or_default(),
            username,
            name: self.display_name(),
            image: self.image_url.clone(),
            created_at: at,
            updated_at: at,
        }
    }
}

fn candidate_usernames(base: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(base.to_string())
        .chain((1..=MAX_USERNAME_SUFFIX).map(move |n| format!("{}_{}", base, n)))
}

impl SocialService {
    /// Map a provider session to a local user id, creating the user on first sight.
    ///
    /// No session is not an error and yields `Ok(None)`. A session that still
    /// has no local user after creation was attempted yields
    /// `UnresolvedIdentity`.
    pub async fn resolve_current_user(
        &self,
        session: Option<&SessionIdentity>,
    ) -> SocialResult<Option<UserId>> {
        let Some(session) = session else {
            return Ok(None);
        };

        if let Some(user) = self.store.find_user_by_external_id(&session.external_id).await? {
            return Ok(Some(user.id));
        }

        let base = session.base_username();
        for username in candidate_usernames(&base) {
            match self.store.insert_user(session.new_user(username.clone(), now())).await {
                Ok(user) => {
                    info!("Created local user {} ({}) for new session", user.id, user.username);
                    return Ok(Some(user.id));
                }
                Err(SocialError::Conflict(reason)) => {
                    debug!("User insert conflicted for {}: {}", username, reason);
                    // A concurrent request may have registered this identity already
                    if let Some(user) =
                        self.store.find_user_by_external_id(&session.external_id).await?
                    {
                        return Ok(Some(user.id));
                    }
                }
                Err(e) => return Err(e),
            }
        }

        warn!("Could not create a local user for external id {}", session.external_id);
        Err(SocialError::UnresolvedIdentity(format!(
            "no local user for external id {}",
            session.external_id
        )))
    }

    /// The full local user record for a resolved viewer
    pub async fn current_user(&self, viewer: Option<UserId>) -> SocialResult<Option<User>> {
        match viewer {
            Some(id) => self.store.find_user(id).await,
            None => Ok(None),
        }
    }
}
