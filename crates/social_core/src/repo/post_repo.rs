//! Post repository for feed, explore, reels and profile grids.
//!
//! # Invariants
//! - List ordering is deterministic: ties on the sort key fall back to
//!   insertion order, newest first.
//! - `hashtags` is stored as a JSON array of strings, or NULL when empty.

use crate::model::enums::MediaType;
use crate::model::post::{NewPost, Post, PostId};
use crate::model::profile::ProfileId;
use crate::realtime::{ChangeKind, Table};
use crate::repo::profile_repo::escape_like;
use crate::repo::{
    normalize_limit, parse_bool, parse_enum, parse_uuid, RepoError, RepoResult, SqliteStore,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use uuid::Uuid;

pub(crate) const POST_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    content,
    media_url,
    media_type,
    hashtags,
    like_count,
    comment_count,
    view_count,
    is_boosted,
    boost_expires_at,
    created_at
FROM posts";

pub const POSTS_DEFAULT_LIMIT: u32 = 20;
pub const POSTS_LIMIT_MAX: u32 = 100;

/// Sort order for post lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostOrder {
    #[default]
    Newest,
    MostLiked,
    /// Posts with a boost still open at `now_ms` first, then newest.
    BoostedFirst { now_ms: i64 },
}

/// Filter and pagination options for listing posts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostListQuery {
    /// Restrict to posts by any of these authors.
    pub authors: Option<Vec<ProfileId>>,
    pub media_type: Option<MediaType>,
    /// Only posts created at or after this epoch ms.
    pub since: Option<i64>,
    /// Content substring (case-insensitive) or exact hashtag match.
    pub search: Option<String>,
    pub order: PostOrder,
    /// Defaults to 20, clamps to 100. `unbounded` overrides it.
    pub limit: Option<u32>,
    pub unbounded: bool,
    pub offset: u32,
}

impl PostListQuery {
    pub fn by_author(author: ProfileId) -> Self {
        Self {
            authors: Some(vec![author]),
            unbounded: true,
            ..Self::default()
        }
    }
}

/// Repository interface for post records.
pub trait PostRepository {
    fn create_post(&self, post: &NewPost) -> RepoResult<Post>;
    fn get_post(&self, id: PostId) -> RepoResult<Option<Post>>;
    fn list_posts(&self, query: &PostListQuery) -> RepoResult<Vec<Post>>;
    /// Hashtag lists of posts created at or after `since`, skipping posts
    /// without hashtags.
    fn hashtags_since(&self, since: i64) -> RepoResult<Vec<Vec<String>>>;
    /// Increments `view_count` and returns the new value.
    fn increment_post_views(&self, id: PostId) -> RepoResult<i64>;
    /// Deletes a post owned by `owner`; likes and comments cascade.
    fn delete_post(&self, id: PostId, owner: ProfileId) -> RepoResult<()>;
}

impl PostRepository for SqliteStore<'_> {
    fn create_post(&self, post: &NewPost) -> RepoResult<Post> {
        post.validate()?;
        let id = Uuid::new_v4();
        let hashtags = post
            .hashtags
            .as_ref()
            .filter(|tags| !tags.is_empty())
            .cloned();
        let hashtags_json = hashtags
            .as_ref()
            .map(|tags| serde_json::to_string(tags))
            .transpose()
            .map_err(|err| RepoError::InvalidData(format!("unserializable hashtags: {err}")))?;

        self.conn().execute(
            "INSERT INTO posts (id, user_id, content, media_url, media_type, hashtags, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                id.to_string(),
                post.user_id.to_string(),
                post.content.as_deref(),
                post.media_url.as_deref(),
                post.media_type.map(MediaType::as_str),
                hashtags_json,
                post.created_at,
            ],
        )?;

        let stored = Post {
            id,
            user_id: post.user_id,
            content: post.content.clone(),
            media_url: post.media_url.clone(),
            media_type: post.media_type,
            hashtags,
            like_count: 0,
            comment_count: 0,
            view_count: 0,
            is_boosted: false,
            boost_expires_at: None,
            created_at: post.created_at,
        };
        self.publish(Table::Posts, ChangeKind::Insert, id, &stored);
        Ok(stored)
    }

    fn get_post(&self, id: PostId) -> RepoResult<Option<Post>> {
        let mut stmt = self
            .conn()
            .prepare_cached(&format!("{POST_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt
            .query_row([id.to_string()], |row| Ok(parse_post_row(row)))
            .optional()?;
        row.transpose()
    }

    fn list_posts(&self, query: &PostListQuery) -> RepoResult<Vec<Post>> {
        let mut sql = format!("{POST_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(authors) = query.authors.as_ref() {
            if authors.is_empty() {
                return Ok(Vec::new());
            }
            let placeholders = vec!["?"; authors.len()].join(", ");
            sql.push_str(&format!(" AND user_id IN ({placeholders})"));
            bind_values.extend(authors.iter().map(|id| Value::Text(id.to_string())));
        }

        if let Some(media_type) = query.media_type {
            sql.push_str(" AND media_type = ?");
            bind_values.push(Value::Text(media_type.as_str().to_string()));
        }

        if let Some(since) = query.since {
            sql.push_str(" AND created_at >= ?");
            bind_values.push(Value::Integer(since));
        }

        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            sql.push_str(
                " AND (unicode_lower(content) LIKE ? ESCAPE '\\'
                   OR EXISTS (SELECT 1 FROM json_each(posts.hashtags)
                              WHERE unicode_lower(json_each.value) = ?))",
            );
            let folded = search.to_lowercase();
            bind_values.push(Value::Text(format!("%{}%", escape_like(&folded))));
            bind_values.push(Value::Text(folded));
        }

        match query.order {
            PostOrder::Newest => sql.push_str(" ORDER BY created_at DESC, rowid DESC"),
            PostOrder::MostLiked => {
                sql.push_str(" ORDER BY like_count DESC, created_at DESC, rowid DESC")
            }
            PostOrder::BoostedFirst { now_ms } => {
                sql.push_str(
                    " ORDER BY (is_boosted = 1 AND boost_expires_at > ?) DESC,
                       created_at DESC, rowid DESC",
                );
                bind_values.push(Value::Integer(now_ms));
            }
        }

        if query.unbounded {
            sql.push_str(" LIMIT -1");
        } else {
            let limit = normalize_limit(query.limit, POSTS_DEFAULT_LIMIT, POSTS_LIMIT_MAX);
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut posts = Vec::new();
        while let Some(row) = rows.next()? {
            posts.push(parse_post_row(row)?);
        }
        Ok(posts)
    }

    fn hashtags_since(&self, since: i64) -> RepoResult<Vec<Vec<String>>> {
        let mut stmt = self.conn().prepare_cached(
            "SELECT hashtags FROM posts
             WHERE hashtags IS NOT NULL AND created_at >= ?1
             ORDER BY created_at DESC, rowid DESC;",
        )?;
        let mut rows = stmt.query([since])?;
        let mut lists = Vec::new();
        while let Some(row) = rows.next()? {
            let text: String = row.get("hashtags")?;
            lists.push(parse_hashtags_json(&text)?);
        }
        Ok(lists)
    }

    fn increment_post_views(&self, id: PostId) -> RepoResult<i64> {
        let count = self
            .conn()
            .query_row(
                "UPDATE posts SET view_count = view_count + 1 WHERE id = ?1 RETURNING view_count;",
                [id.to_string()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .ok_or(RepoError::NotFound { entity: "post", id })?;

        if let Some(post) = self.get_post(id)? {
            self.publish(Table::Posts, ChangeKind::Update, id, &post);
        }
        Ok(count)
    }

    fn delete_post(&self, id: PostId, owner: ProfileId) -> RepoResult<()> {
        let existing = self
            .get_post(id)?
            .filter(|post| post.user_id == owner)
            .ok_or(RepoError::NotFound { entity: "post", id })?;
        self.conn().execute(
            "DELETE FROM posts WHERE id = ?1 AND user_id = ?2;",
            params![id.to_string(), owner.to_string()],
        )?;
        self.publish(Table::Posts, ChangeKind::Delete, id, &existing);
        Ok(())
    }
}

pub(crate) fn parse_post_row(row: &Row<'_>) -> RepoResult<Post> {
    let id_text: String = row.get("id")?;
    let user_text: String = row.get("user_id")?;
    let media_type = match row.get::<_, Option<String>>("media_type")? {
        Some(value) => Some(parse_enum(&value, "posts.media_type", MediaType::parse)?),
        None => None,
    };
    let hashtags = match row.get::<_, Option<String>>("hashtags")? {
        Some(text) => Some(parse_hashtags_json(&text)?),
        None => None,
    };

    let post = Post {
        id: parse_uuid(&id_text, "posts.id")?,
        user_id: parse_uuid(&user_text, "posts.user_id")?,
        content: row.get("content")?,
        media_url: row.get("media_url")?,
        media_type,
        hashtags,
        like_count: row.get("like_count")?,
        comment_count: row.get("comment_count")?,
        view_count: row.get("view_count")?,
        is_boosted: parse_bool(row.get("is_boosted")?, "posts.is_boosted")?,
        boost_expires_at: row.get("boost_expires_at")?,
        created_at: row.get("created_at")?,
    };
    post.validate()?;
    Ok(post)
}

fn parse_hashtags_json(text: &str) -> RepoResult<Vec<String>> {
    serde_json::from_str(text)
        .map_err(|err| RepoError::InvalidData(format!("invalid posts.hashtags `{text}`: {err}")))
}
