// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::users;

pub type UserId = i32;

/// Local user record, keyed by the identity provider's external id
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: UserId,
    pub external_id: String,
    pub email: String,
    pub username: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub image: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub external_id: String,
    pub email: String,
    pub username: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Editable profile fields. `None` clears the column.
#[derive(Debug, Clone, PartialEq, AsChangeset, Serialize, Deserialize)]
#[diesel(table_name = users, treat_none_as_null = true)]
pub struct UserChanges {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub updated_at: NaiveDateTime,
}

/// Compact author block embedded in posts, comments and notifications
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AuthorSummary {
    pub id: UserId,
    pub username: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

impl From<&User> for AuthorSummary {
    fn from(user: &User) -> Self {
        AuthorSummary {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
            image: user.image.clone(),
        }
    }
}

/// Aggregates shown on a profile page, derived by counting rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCounts {
    pub followers: i64,
    pub following: i64,
    pub posts: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileView {
    pub id: UserId,
    pub username: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub image: Option<String>,
    pub created_at: NaiveDateTime,
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: i64,
    /// Whether the viewer follows this user; false for anonymous viewers
    pub is_following: bool,
}

impl ProfileView {
    pub fn new(user: User, counts: ProfileCounts, is_following: bool) -> Self {
        ProfileView {
            id: user.id,
            username: user.username,
            name: user.name,
            bio: user.bio,
            website: user.website,
            location: user.location,
            image: user.image,
            created_at: user.created_at,
            followers_count: counts.followers,
            following_count: counts.following,
            posts_count: counts.posts,
            is_following,
        }
    }
}

/// Profile edit request as submitted by the client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}
