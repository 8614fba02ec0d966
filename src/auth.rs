// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

//! Session identities supplied by the external identity provider.

use async_trait::async_trait;
use axum::http::HeaderMap;
use tracing::trace;

use crate::service::SessionIdentity;

/// Source of authenticated session identities for incoming requests
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The session behind a request, or `None` for anonymous callers
    async fn authenticate(&self, headers: &HeaderMap) -> Option<SessionIdentity>;
}

/// Trusts identity headers injected by an authenticating reverse proxy.
///
/// The proxy validates the provider session and forwards
/// `{prefix}user-id`, `{prefix}email`, `{prefix}username`,
/// `{prefix}first-name`, `{prefix}last-name` and `{prefix}image-url`.
/// Requests without `{prefix}user-id` are anonymous.
#[derive(Debug, Clone)]
pub struct TrustedHeaderProvider {
    prefix: String,
}

impl TrustedHeaderProvider {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().to_ascii_lowercase(),
        }
    }

    fn header(&self, headers: &HeaderMap, name: &str) -> Option<String> {
        headers
            .get(format!("{}{}", self.prefix, name).as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

#[async_trait]
impl IdentityProvider for TrustedHeaderProvider {
    async fn authenticate(&self, headers: &HeaderMap) -> Option<SessionIdentity> {
        let external_id = self.header(headers, "user-id")?;
        trace!("Authenticated session for external id {}", external_id);
        Some(SessionIdentity {
            external_id,
            email: self.header(headers, "email"),
            first_name: self.header(headers, "first-name"),
            last_name: self.header(headers, "last-name"),
            username: self.header(headers, "username"),
            image_url: self.header(headers, "image-url"),
        })
    }
}
