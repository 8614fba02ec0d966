// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

pub mod comment;
pub mod follow;
pub mod like;
pub mod notification;
pub mod post;
pub mod user;

pub use comment::{Comment, CommentId, CommentView, NewComment};
pub use follow::{Follow, FollowState, NewFollow};
pub use like::{Like, LikeState, LikeToggle, NewLike};
pub use notification::{
    CommentSummary, NewNotification, Notification, NotificationId, NotificationKind,
    NotificationView, PostSummary,
};
pub use post::{
    FeedCursor, FeedFilter, NewPost, Post, PostDetails, PostId, PostPage, PostQuery, PostView,
};
pub use user::{
    AuthorSummary, NewUser, ProfileCounts, ProfileUpdate, ProfileView, User, UserChanges, UserId,
};
