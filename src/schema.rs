// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

// Import diesel table macros
use diesel::{allow_tables_to_appear_in_same_query, joinable, table};

table! {
    users (id) {
        id -> Integer,
        external_id -> Varchar,
        email -> Varchar,
        username -> Varchar,
        name -> Nullable<Varchar>,
        bio -> Nullable<Text>,
        website -> Nullable<Varchar>,
        location -> Nullable<Varchar>,
        image -> Nullable<Varchar>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    posts (id) {
        id -> Integer,
        author_id -> Integer,
        content -> Text,
        image -> Nullable<Varchar>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    comments (id) {
        id -> Integer,
        post_id -> Integer,
        author_id -> Integer,
        content -> Text,
        created_at -> Timestamp,
    }
}

table! {
    likes (id) {
        id -> Integer,
        user_id -> Integer,
        post_id -> Integer,
        created_at -> Timestamp,
    }
}

table! {
    follows (id) {
        id -> Integer,
        follower_id -> Integer,
        following_id -> Integer,
        created_at -> Timestamp,
    }
}

table! {
    notifications (id) {
        id -> Integer,
        user_id -> Integer,
        actor_id -> Integer,
        kind -> Varchar,
        post_id -> Nullable<Integer>,
        comment_id -> Nullable<Integer>,
        read -> Bool,
        created_at -> Timestamp,
    }
}

joinable!(posts -> users (author_id));
joinable!(comments -> posts (post_id));
joinable!(likes -> posts (post_id));

allow_tables_to_appear_in_same_query!(
    users,
    posts,
    comments,
    likes,
    follows,
    notifications,
);
