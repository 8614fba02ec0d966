// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::user::UserId;
use crate::schema::follows;

/// Model for a follow relationship (directed edge follower -> following)
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = follows)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Follow {
    pub id: i32,
    pub follower_id: UserId,
    pub following_id: UserId,
    pub created_at: NaiveDateTime,
}

/// DTO for creating a new follow relationship
#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = follows)]
pub struct NewFollow {
    pub follower_id: UserId,
    pub following_id: UserId,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowState {
    pub user_id: UserId,
    pub following: bool,
}
