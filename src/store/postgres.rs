// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::{debug, error};

use super::{escape_like, SocialStore};
use crate::db::{Database, DbConnection};
use crate::error::{SocialError, SocialResult};
use crate::models::{
    AuthorSummary, Comment, CommentId, CommentSummary, CommentView, FeedFilter, LikeToggle,
    NewComment, NewFollow, NewLike, NewNotification, NewPost, NewUser, Notification,
    NotificationId, NotificationKind, NotificationView, Post, PostDetails, PostId, PostPage,
    PostQuery, PostSummary, ProfileCounts, User, UserChanges, UserId,
};
use crate::schema::{comments, follows, likes, notifications, posts, users};

diesel::sql_function!(fn lower(x: diesel::sql_types::Text) -> diesel::sql_types::Text);

/// Postgres-backed store using the shared async connection pool
pub struct PgStore {
    db: Arc<Database>,
}

impl PgStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Get a database connection from the pool
    async fn get_connection(&self) -> SocialResult<DbConnection> {
        self.db.get_connection().await.map_err(|e| {
            error!("Database connection error: {}", e);
            SocialError::from(e)
        })
    }
}

async fn insert_notification(
    conn: &mut AsyncPgConnection,
    notification: &NewNotification,
) -> Result<Notification, diesel::result::Error> {
    diesel::insert_into(notifications::table)
        .values(notification)
        .returning(Notification::as_returning())
        .get_result(conn)
        .await
}

/// Posts matching `query` with their authors, newest first
async fn load_post_rows(
    conn: &mut AsyncPgConnection,
    query: &PostQuery,
) -> Result<Vec<(Post, AuthorSummary)>, diesel::result::Error> {
    let mut select = posts::table
        .inner_join(users::table)
        .select((Post::as_select(), AuthorSummary::as_select()))
        .into_boxed();

    select = match query.filter {
        FeedFilter::All => select,
        FeedFilter::Author(author_id) => select.filter(posts::author_id.eq(author_id)),
        FeedFilter::LikedBy(user_id) => select.filter(
            posts::id.eq_any(
                likes::table
                    .filter(likes::user_id.eq(user_id))
                    .select(likes::post_id),
            ),
        ),
    };

    if let Some(cursor) = query.after {
        select = select.filter(
            posts::created_at.lt(cursor.created_at).or(posts::created_at
                .eq(cursor.created_at)
                .and(posts::id.lt(cursor.id))),
        );
    }

    select
        .order((posts::created_at.desc(), posts::id.desc()))
        .limit(query.limit)
        .load::<(Post, AuthorSummary)>(conn)
        .await
}

/// Like counts, liker ids and comments for the given posts
async fn load_post_details(
    conn: &mut AsyncPgConnection,
    post_ids: &[PostId],
) -> Result<PostDetails, diesel::result::Error> {
    if post_ids.is_empty() {
        return Ok(PostDetails::default());
    }

    let counts = likes::table
        .filter(likes::post_id.eq_any(post_ids))
        .group_by(likes::post_id)
        .select((likes::post_id, count_star()))
        .load::<(PostId, i64)>(conn)
        .await?;

    let likers = likes::table
        .filter(likes::post_id.eq_any(post_ids))
        .order((likes::post_id.asc(), likes::created_at.asc(), likes::id.asc()))
        .select((likes::post_id, likes::user_id))
        .load::<(PostId, UserId)>(conn)
        .await?;

    let comment_rows = comments::table
        .inner_join(users::table.on(users::id.eq(comments::author_id)))
        .filter(comments::post_id.eq_any(post_ids))
        .order((comments::created_at.asc(), comments::id.asc()))
        .select((Comment::as_select(), AuthorSummary::as_select()))
        .load::<(Comment, AuthorSummary)>(conn)
        .await?;

    Ok(PostDetails::from_rows(counts, likers, comment_rows))
}

type NotificationRow = (
    Notification,
    AuthorSummary,
    Option<(PostId, String, Option<String>)>,
    Option<(CommentId, String, NaiveDateTime)>,
);

#[async_trait]
impl SocialStore for PgStore {
    async fn ping(&self) -> SocialResult<()> {
        let mut conn = self.get_connection().await?;
        diesel::sql_query("SELECT 1").execute(&mut conn).await?;
        Ok(())
    }

    async fn find_user(&self, id: UserId) -> SocialResult<Option<User>> {
        let mut conn = self.get_connection().await?;
        let user = users::table
            .find(id)
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(user)
    }

    async fn find_user_by_external_id(&self, external_id: &str) -> SocialResult<Option<User>> {
        let mut conn = self.get_connection().await?;
        let user = users::table
            .filter(users::external_id.eq(external_id))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> SocialResult<Option<User>> {
        let mut conn = self.get_connection().await?;
        let user = users::table
            .filter(users::username.eq(username))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(user)
    }

    async fn insert_user(&self, user: NewUser) -> SocialResult<User> {
        let mut conn = self.get_connection().await?;
        let created = diesel::insert_into(users::table)
            .values(&user)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(created)
    }

    async fn update_user(&self, id: UserId, changes: UserChanges) -> SocialResult<User> {
        let mut conn = self.get_connection().await?;
        let updated = diesel::update(users::table.find(id))
            .set(&changes)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::NotFound => SocialError::NotFound("user".to_string()),
                other => other.into(),
            })?;
        Ok(updated)
    }

    async fn search_users(&self, needle: &str, limit: i64) -> SocialResult<Vec<AuthorSummary>> {
        let mut conn = self.get_connection().await?;
        let pattern = format!("%{}%", escape_like(needle));
        let found = users::table
            .filter(users::username.ilike(pattern))
            .order((lower(users::username).asc(), users::username.asc()))
            .limit(limit)
            .select(AuthorSummary::as_select())
            .load(&mut conn)
            .await?;
        Ok(found)
    }

    async fn profile_counts(&self, id: UserId) -> SocialResult<ProfileCounts> {
        let mut conn = self.get_connection().await?;

        let followers = follows::table
            .filter(follows::following_id.eq(id))
            .count()
            .get_result::<i64>(&mut conn)
            .await?;
        let following = follows::table
            .filter(follows::follower_id.eq(id))
            .count()
            .get_result::<i64>(&mut conn)
            .await?;
        let posts = posts::table
            .filter(posts::author_id.eq(id))
            .count()
            .get_result::<i64>(&mut conn)
            .await?;

        Ok(ProfileCounts {
            followers,
            following,
            posts,
        })
    }

    async fn follow_exists(&self, follower: UserId, following: UserId) -> SocialResult<bool> {
        let mut conn = self.get_connection().await?;
        let count = follows::table
            .filter(follows::follower_id.eq(follower))
            .filter(follows::following_id.eq(following))
            .count()
            .get_result::<i64>(&mut conn)
            .await?;
        Ok(count > 0)
    }

    async fn toggle_follow(&self, follow: NewFollow) -> SocialResult<bool> {
        let mut conn = self.get_connection().await?;
        let conn: &mut AsyncPgConnection = &mut conn;

        let outcome = conn.transaction::<_, SocialError, _>(|conn| {
            async move {
                let deleted = diesel::delete(
                    follows::table
                        .filter(follows::follower_id.eq(follow.follower_id))
                        .filter(follows::following_id.eq(follow.following_id)),
                )
                .execute(conn)
                .await?;
                if deleted > 0 {
                    return Ok(false);
                }

                // A concurrent follow that won the race leaves us in the desired state
                let inserted = diesel::insert_into(follows::table)
                    .values(&follow)
                    .on_conflict((follows::follower_id, follows::following_id))
                    .do_nothing()
                    .execute(conn)
                    .await?;
                debug!("Follow insert affected {} row(s)", inserted);
                Ok(true)
            }
            .scope_boxed()
        })
        .await?;
        Ok(outcome)
    }

    async fn insert_post(&self, post: NewPost) -> SocialResult<Post> {
        let mut conn = self.get_connection().await?;
        let created = diesel::insert_into(posts::table)
            .values(&post)
            .returning(Post::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(created)
    }

    async fn find_post(&self, id: PostId) -> SocialResult<Option<Post>> {
        let mut conn = self.get_connection().await?;
        let post = posts::table
            .find(id)
            .select(Post::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(post)
    }

    async fn delete_post(&self, id: PostId) -> SocialResult<bool> {
        let mut conn = self.get_connection().await?;
        // comments, likes and notifications go with it through ON DELETE CASCADE
        let deleted = diesel::delete(posts::table.find(id))
            .execute(&mut conn)
            .await?;
        Ok(deleted > 0)
    }

    async fn create_comment(
        &self,
        comment: NewComment,
        recipient: UserId,
    ) -> SocialResult<(CommentView, Option<Notification>)> {
        let mut conn = self.get_connection().await?;
        let conn: &mut AsyncPgConnection = &mut conn;

        let outcome = conn.transaction::<_, SocialError, _>(|conn| {
            async move {
                let created = diesel::insert_into(comments::table)
                    .values(&comment)
                    .returning(Comment::as_returning())
                    .get_result(conn)
                    .await?;

                let notification = match NewNotification::for_interaction(
                    NotificationKind::Comment,
                    recipient,
                    created.author_id,
                    Some(created.post_id),
                    Some(created.id),
                    created.created_at,
                ) {
                    Some(new) => Some(insert_notification(conn, &new).await?),
                    None => None,
                };

                let author = users::table
                    .find(created.author_id)
                    .select(AuthorSummary::as_select())
                    .first(conn)
                    .await?;
                Ok((CommentView::new(created, author), notification))
            }
            .scope_boxed()
        })
        .await?;
        Ok(outcome)
    }

    async fn find_comment(&self, id: CommentId) -> SocialResult<Option<Comment>> {
        let mut conn = self.get_connection().await?;
        let comment = comments::table
            .find(id)
            .select(Comment::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(comment)
    }

    async fn delete_comment(&self, id: CommentId) -> SocialResult<bool> {
        let mut conn = self.get_connection().await?;
        let deleted = diesel::delete(comments::table.find(id))
            .execute(&mut conn)
            .await?;
        Ok(deleted > 0)
    }

    async fn toggle_like(&self, like: NewLike, recipient: UserId) -> SocialResult<LikeToggle> {
        let mut conn = self.get_connection().await?;
        let conn: &mut AsyncPgConnection = &mut conn;

        let outcome = conn.transaction::<_, SocialError, _>(|conn| {
            async move {
                let deleted = diesel::delete(
                    likes::table
                        .filter(likes::user_id.eq(like.user_id))
                        .filter(likes::post_id.eq(like.post_id)),
                )
                .execute(conn)
                .await?;
                if deleted > 0 {
                    return Ok(LikeToggle {
                        liked: false,
                        notification: None,
                    });
                }

                let inserted = diesel::insert_into(likes::table)
                    .values(&like)
                    .on_conflict((likes::user_id, likes::post_id))
                    .do_nothing()
                    .execute(conn)
                    .await?;
                if inserted == 0 {
                    // Another request liked it first and already notified
                    return Ok(LikeToggle {
                        liked: true,
                        notification: None,
                    });
                }

                let notification = match NewNotification::for_interaction(
                    NotificationKind::Like,
                    recipient,
                    like.user_id,
                    Some(like.post_id),
                    None,
                    like.created_at,
                ) {
                    Some(new) => Some(insert_notification(conn, &new).await?),
                    None => None,
                };

                Ok(LikeToggle {
                    liked: true,
                    notification,
                })
            }
            .scope_boxed()
        })
        .await?;
        Ok(outcome)
    }

    async fn like_count(&self, post_id: PostId) -> SocialResult<i64> {
        let mut conn = self.get_connection().await?;
        let count = likes::table
            .filter(likes::post_id.eq(post_id))
            .count()
            .get_result::<i64>(&mut conn)
            .await?;
        Ok(count)
    }

    async fn feed_page(&self, query: &PostQuery) -> SocialResult<PostPage> {
        let mut conn = self.get_connection().await?;
        let conn: &mut AsyncPgConnection = &mut conn;

        // One snapshot so rows, counts, likers and comments agree with each other
        let page = conn
            .build_transaction()
            .read_only()
            .repeatable_read()
            .run::<_, SocialError, _>(|conn| {
                async move {
                    let rows = load_post_rows(conn, query).await?;
                    let details = load_post_details(conn, &PostPage::post_ids(&rows)).await?;
                    Ok(PostPage { rows, details })
                }
                .scope_boxed()
            })
            .await?;
        Ok(page)
    }

    async fn post_page(&self, id: PostId) -> SocialResult<PostPage> {
        let mut conn = self.get_connection().await?;
        let conn: &mut AsyncPgConnection = &mut conn;

        let page = conn
            .build_transaction()
            .read_only()
            .repeatable_read()
            .run::<_, SocialError, _>(|conn| {
                async move {
                    let rows = posts::table
                        .inner_join(users::table)
                        .filter(posts::id.eq(id))
                        .select((Post::as_select(), AuthorSummary::as_select()))
                        .load::<(Post, AuthorSummary)>(conn)
                        .await?;
                    let details = load_post_details(conn, &PostPage::post_ids(&rows)).await?;
                    Ok(PostPage { rows, details })
                }
                .scope_boxed()
            })
            .await?;
        Ok(page)
    }

    async fn list_notifications(&self, user_id: UserId) -> SocialResult<Vec<NotificationView>> {
        let mut conn = self.get_connection().await?;

        let rows = notifications::table
            .inner_join(users::table.on(users::id.eq(notifications::actor_id)))
            .left_join(posts::table.on(posts::id.nullable().eq(notifications::post_id)))
            .left_join(comments::table.on(comments::id.nullable().eq(notifications::comment_id)))
            .filter(notifications::user_id.eq(user_id))
            .order((notifications::created_at.desc(), notifications::id.desc()))
            .select((
                Notification::as_select(),
                AuthorSummary::as_select(),
                (posts::id, posts::content, posts::image).nullable(),
                (comments::id, comments::content, comments::created_at).nullable(),
            ))
            .load::<NotificationRow>(&mut conn)
            .await?;

        rows.into_iter()
            .map(|(notification, actor, post, comment)| {
                NotificationView::new(
                    notification,
                    actor,
                    post.map(|(id, content, image)| PostSummary { id, content, image }),
                    comment.map(|(id, content, created_at)| CommentSummary {
                        id,
                        content,
                        created_at,
                    }),
                )
            })
            .collect()
    }

    async fn mark_notifications_read(
        &self,
        user_id: UserId,
        ids: &[NotificationId],
    ) -> SocialResult<usize> {
        let mut conn = self.get_connection().await?;
        let updated = diesel::update(
            notifications::table
                .filter(notifications::user_id.eq(user_id))
                .filter(notifications::id.eq_any(ids)),
        )
        .set(notifications::read.eq(true))
        .execute(&mut conn)
        .await?;
        Ok(updated)
    }

    async fn unread_notifications(&self, user_id: UserId) -> SocialResult<i64> {
        let mut conn = self.get_connection().await?;
        let count = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .filter(notifications::read.eq(false))
            .count()
            .get_result::<i64>(&mut conn)
            .await?;
        Ok(count)
    }
}

/// These run against the database named by `DATABASE_URL` and are skipped
/// when it is unset. Every test creates its own uniquely named users, so the
/// database can be shared and reused.
#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    use chrono::{NaiveDate, Utc};
    use once_cell::sync::Lazy;

    use super::*;
    use crate::config::{DatabaseConfig, StoreBackend};

    static MIGRATIONS_LOCK: Lazy<tokio::sync::Mutex<()>> =
        Lazy::new(|| tokio::sync::Mutex::new(()));
    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    async fn store() -> Option<PgStore> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping Postgres store test");
            return None;
        };
        let config = DatabaseConfig {
            url,
            max_connections: 4,
            backend: StoreBackend::Postgres,
        };
        let _guard = MIGRATIONS_LOCK.lock().await;
        let db = Database::new(&config).await.unwrap();
        Some(PgStore::new(Arc::new(db)))
    }

    /// Lowercase tag no other test run shares
    fn unique_tag() -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        format!("t{}x{}", nanos, COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    fn new_user(external_id: &str, username: &str) -> NewUser {
        let now = Utc::now().naive_utc();
        NewUser {
            external_id: external_id.to_string(),
            email: format!("{username}@example.com"),
            username: username.to_string(),
            name: None,
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn user(store: &PgStore, tag: &str, name: &str) -> User {
        let username = format!("{tag}_{name}");
        store
            .insert_user(new_user(&format!("ext-{username}"), &username))
            .await
            .unwrap()
    }

    fn new_post(author_id: UserId, content: &str, created_at: NaiveDateTime) -> NewPost {
        NewPost {
            author_id,
            content: content.to_string(),
            image: Some("https://media.example.com/p.png".to_string()),
            created_at,
            updated_at: created_at,
        }
    }

    fn new_like(user_id: UserId, post_id: PostId) -> NewLike {
        NewLike {
            user_id,
            post_id,
            created_at: Utc::now().naive_utc(),
        }
    }

    fn new_comment(post_id: PostId, author_id: UserId, content: &str) -> NewComment {
        NewComment {
            post_id,
            author_id,
            content: content.to_string(),
            created_at: Utc::now().naive_utc(),
        }
    }

    async fn notifications_for_post(store: &PgStore, user_id: UserId, post_id: PostId) -> usize {
        store
            .list_notifications(user_id)
            .await
            .unwrap()
            .iter()
            .filter(|n| n.post.as_ref().map(|p| p.id) == Some(post_id))
            .count()
    }

    #[tokio::test]
    async fn usernames_and_external_ids_are_unique() {
        let Some(store) = store().await else { return };
        let tag = unique_tag();
        let alice = format!("{tag}_alice");
        store
            .insert_user(new_user(&format!("ext-{tag}-1"), &alice))
            .await
            .unwrap();

        let dup_name = store
            .insert_user(new_user(&format!("ext-{tag}-2"), &alice))
            .await;
        assert!(matches!(dup_name, Err(SocialError::Conflict(_))));

        let dup_ext = store
            .insert_user(new_user(&format!("ext-{tag}-1"), &format!("{tag}_bob")))
            .await;
        assert!(matches!(dup_ext, Err(SocialError::Conflict(_))));
    }

    #[tokio::test]
    async fn self_follow_is_rejected_by_the_check_constraint() {
        let Some(store) = store().await else { return };
        let tag = unique_tag();
        let alice = user(&store, &tag, "alice").await;
        let result = store
            .toggle_follow(NewFollow {
                follower_id: alice.id,
                following_id: alice.id,
                created_at: Utc::now().naive_utc(),
            })
            .await;
        assert!(matches!(result, Err(SocialError::Validation(_))));
        assert!(!store.follow_exists(alice.id, alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn follow_toggles_on_and_off() {
        let Some(store) = store().await else { return };
        let tag = unique_tag();
        let alice = user(&store, &tag, "alice").await;
        let bob = user(&store, &tag, "bob").await;
        let follow = NewFollow {
            follower_id: alice.id,
            following_id: bob.id,
            created_at: Utc::now().naive_utc(),
        };

        assert!(store.toggle_follow(follow.clone()).await.unwrap());
        assert!(store.follow_exists(alice.id, bob.id).await.unwrap());
        assert_eq!(store.profile_counts(bob.id).await.unwrap().followers, 1);

        assert!(!store.toggle_follow(follow).await.unwrap());
        assert!(!store.follow_exists(alice.id, bob.id).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_a_post_cascades() {
        let Some(store) = store().await else { return };
        let tag = unique_tag();
        let alice = user(&store, &tag, "alice").await;
        let bob = user(&store, &tag, "bob").await;
        let post = store
            .insert_post(new_post(alice.id, "hi", Utc::now().naive_utc()))
            .await
            .unwrap();

        let (comment, notified) = store
            .create_comment(new_comment(post.id, bob.id, "yo"), alice.id)
            .await
            .unwrap();
        assert_eq!(comment.author.username, bob.username);
        assert!(notified.is_some());
        let toggle = store
            .toggle_like(new_like(bob.id, post.id), alice.id)
            .await
            .unwrap();
        assert!(toggle.liked);
        assert_eq!(toggle.notification.map(|n| n.user_id), Some(alice.id));
        assert_eq!(store.unread_notifications(alice.id).await.unwrap(), 2);

        assert!(store.delete_post(post.id).await.unwrap());
        assert_eq!(store.like_count(post.id).await.unwrap(), 0);
        assert!(store.list_notifications(alice.id).await.unwrap().is_empty());
        assert_eq!(store.find_comment(comment.id).await.unwrap(), None);
        assert_eq!(store.post_page(post.id).await.unwrap(), PostPage::default());
        assert!(!store.delete_post(post.id).await.unwrap());
    }

    #[tokio::test]
    async fn keyset_cursor_breaks_timestamp_ties_by_id() {
        let Some(store) = store().await else { return };
        let tag = unique_tag();
        let alice = user(&store, &tag, "alice").await;
        let bob = user(&store, &tag, "bob").await;
        let created_at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap();
        let mut ids = Vec::new();
        for content in ["one", "two", "three"] {
            let post = store
                .insert_post(new_post(alice.id, content, created_at))
                .await
                .unwrap();
            ids.push(post.id);
        }
        store
            .toggle_like(new_like(bob.id, ids[2]), alice.id)
            .await
            .unwrap();

        let query = PostQuery {
            filter: FeedFilter::Author(alice.id),
            after: None,
            limit: 2,
        };
        let page = store.feed_page(&query).await.unwrap();
        assert_eq!(PostPage::post_ids(&page.rows), vec![ids[2], ids[1]]);
        assert_eq!(page.details.like_counts.get(&ids[2]), Some(&1));
        assert_eq!(page.details.likers.get(&ids[2]), Some(&vec![bob.id]));

        let rest = store
            .feed_page(&PostQuery {
                after: page.next_cursor(2),
                ..query
            })
            .await
            .unwrap();
        assert_eq!(PostPage::post_ids(&rest.rows), vec![ids[0]]);
        assert!(rest.details.like_counts.is_empty());
        assert_eq!(rest.next_cursor(2), None);

        let liked = store
            .feed_page(&PostQuery {
                filter: FeedFilter::LikedBy(bob.id),
                after: None,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(PostPage::post_ids(&liked.rows), vec![ids[2]]);
    }

    #[tokio::test]
    async fn notifications_join_optional_post_and_comment() {
        let Some(store) = store().await else { return };
        let tag = unique_tag();
        let alice = user(&store, &tag, "alice").await;
        let bob = user(&store, &tag, "bob").await;
        let post = store
            .insert_post(new_post(alice.id, "cat", Utc::now().naive_utc()))
            .await
            .unwrap();

        store
            .toggle_like(new_like(bob.id, post.id), alice.id)
            .await
            .unwrap();
        let (comment, _) = store
            .create_comment(new_comment(post.id, bob.id, "nice cat"), alice.id)
            .await
            .unwrap();

        let inbox = store.list_notifications(alice.id).await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert!(inbox.iter().all(|n| n.actor.id == bob.id && !n.read));

        let like = inbox
            .iter()
            .find(|n| n.kind == NotificationKind::Like)
            .unwrap();
        assert_eq!(like.post.as_ref().map(|p| p.id), Some(post.id));
        assert_eq!(like.comment, None);

        let commented = inbox
            .iter()
            .find(|n| n.kind == NotificationKind::Comment)
            .unwrap();
        assert_eq!(commented.post.as_ref().map(|p| p.content.as_str()), Some("cat"));
        let summary = commented.comment.as_ref().unwrap();
        assert_eq!(summary.id, comment.id);
        assert_eq!(summary.content, "nice cat");

        let updated = store
            .mark_notifications_read(bob.id, &[like.id, commented.id])
            .await
            .unwrap();
        assert_eq!(updated, 0);
        let updated = store
            .mark_notifications_read(alice.id, &[like.id])
            .await
            .unwrap();
        assert_eq!(updated, 1);
        assert_eq!(store.unread_notifications(alice.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn search_orders_case_insensitively() {
        let Some(store) = store().await else { return };
        let tag = unique_tag();
        for name in ["Alicia", "alice", "bob", "ALIBI"] {
            user(&store, &tag, name).await;
        }
        let found: Vec<String> = store
            .search_users(&format!("{tag}_ali"), 10)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        let expected: Vec<String> = ["ALIBI", "alice", "Alicia"]
            .iter()
            .map(|name| format!("{tag}_{name}"))
            .collect();
        assert_eq!(found, expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_like_toggles_leave_at_most_one_like() {
        let Some(store) = store().await else { return };
        let store = Arc::new(store);
        let tag = unique_tag();
        let alice = user(&store, &tag, "alice").await;
        let bob = user(&store, &tag, "bob").await;

        for round in 0..8 {
            let content = format!("race {round}");
            let post = store
                .insert_post(new_post(alice.id, &content, Utc::now().naive_utc()))
                .await
                .unwrap();

            let first = tokio::spawn({
                let store = store.clone();
                async move { store.toggle_like(new_like(bob.id, post.id), alice.id).await }
            });
            let second = tokio::spawn({
                let store = store.clone();
                async move { store.toggle_like(new_like(bob.id, post.id), alice.id).await }
            });
            let (first, second) = tokio::join!(first, second);
            let (first, second) = (first.unwrap().unwrap(), second.unwrap().unwrap());

            let count = store.like_count(post.id).await.unwrap();
            let notified = notifications_for_post(&store, alice.id, post.id).await;
            assert!(count <= 1, "round {round}: {count} like rows");
            assert!(notified <= 1, "round {round}: {notified} notifications");
            assert!(
                first.notification.is_none() || second.notification.is_none(),
                "round {round}: both toggles notified"
            );
            match (first.liked, second.liked) {
                // both inserted concurrently, one lost to ON CONFLICT DO NOTHING
                (true, true) => {
                    assert_eq!(count, 1);
                    assert_eq!(notified, 1);
                }
                // serialized: like then unlike
                (true, false) | (false, true) => assert_eq!(count, 0),
                (false, false) => panic!("round {round}: neither toggle liked"),
            }
        }
    }
}
