//! Story repository.

use crate::model::profile::ProfileId;
use crate::model::story::{NewStory, Story, StoryId};
use crate::realtime::{ChangeKind, Table};
use crate::repo::{parse_uuid, RepoError, RepoResult, SqliteStore};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

const STORY_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    content,
    media_url,
    media_type,
    like_count,
    comment_count,
    view_count,
    expires_at,
    created_at
FROM stories";

/// Repository interface for story records.
pub trait StoryRepository {
    fn create_story(&self, story: &NewStory) -> RepoResult<Story>;
    fn get_story(&self, id: StoryId) -> RepoResult<Option<Story>>;
    /// Stories with `expires_at > now_ms`, newest first; optionally by author.
    fn list_active_stories(
        &self,
        now_ms: i64,
        author: Option<ProfileId>,
    ) -> RepoResult<Vec<Story>>;
    fn increment_story_views(&self, id: StoryId) -> RepoResult<i64>;
    /// Deletes expired stories and returns how many were removed.
    fn purge_expired_stories(&self, now_ms: i64) -> RepoResult<usize>;
}

impl StoryRepository for SqliteStore<'_> {
    fn create_story(&self, story: &NewStory) -> RepoResult<Story> {
        story.validate()?;
        let id = Uuid::new_v4();
        self.conn().execute(
            "INSERT INTO stories (id, user_id, content, media_url, media_type, expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                id.to_string(),
                story.user_id.to_string(),
                story.content.as_deref(),
                story.media_url.as_str(),
                story.media_type.as_deref(),
                story.expires_at,
                story.created_at,
            ],
        )?;

        let stored = Story {
            id,
            user_id: story.user_id,
            content: story.content.clone(),
            media_url: story.media_url.clone(),
            media_type: story.media_type.clone(),
            like_count: 0,
            comment_count: 0,
            view_count: 0,
            expires_at: story.expires_at,
            created_at: story.created_at,
        };
        self.publish(Table::Stories, ChangeKind::Insert, id, &stored);
        Ok(stored)
    }

    fn get_story(&self, id: StoryId) -> RepoResult<Option<Story>> {
        let mut stmt = self
            .conn()
            .prepare_cached(&format!("{STORY_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt
            .query_row([id.to_string()], |row| Ok(parse_story_row(row)))
            .optional()?;
        row.transpose()
    }

    fn list_active_stories(
        &self,
        now_ms: i64,
        author: Option<ProfileId>,
    ) -> RepoResult<Vec<Story>> {
        let mut stmt = self.conn().prepare_cached(&format!(
            "{STORY_SELECT_SQL}
             WHERE expires_at > ?1
               AND (?2 IS NULL OR user_id = ?2)
             ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query(params![now_ms, author.map(|id| id.to_string())])?;
        let mut stories = Vec::new();
        while let Some(row) = rows.next()? {
            stories.push(parse_story_row(row)?);
        }
        Ok(stories)
    }

    fn increment_story_views(&self, id: StoryId) -> RepoResult<i64> {
        let count = self
            .conn()
            .query_row(
                "UPDATE stories SET view_count = view_count + 1 WHERE id = ?1 RETURNING view_count;",
                [id.to_string()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .ok_or(RepoError::NotFound {
                entity: "story",
                id,
            })?;
        if let Some(story) = self.get_story(id)? {
            self.publish(Table::Stories, ChangeKind::Update, id, &story);
        }
        Ok(count)
    }

    fn purge_expired_stories(&self, now_ms: i64) -> RepoResult<usize> {
        let mut stmt = self.conn().prepare_cached(&format!(
            "{STORY_SELECT_SQL} WHERE expires_at <= ?1;"
        ))?;
        let mut rows = stmt.query([now_ms])?;
        let mut expired = Vec::new();
        while let Some(row) = rows.next()? {
            expired.push(parse_story_row(row)?);
        }
        drop(rows);

        let removed = self
            .conn()
            .execute("DELETE FROM stories WHERE expires_at <= ?1;", [now_ms])?;
        for story in &expired {
            self.publish(Table::Stories, ChangeKind::Delete, story.id, story);
        }
        Ok(removed)
    }
}

fn parse_story_row(row: &Row<'_>) -> RepoResult<Story> {
    let id_text: String = row.get("id")?;
    let user_text: String = row.get("user_id")?;
    let story = Story {
        id: parse_uuid(&id_text, "stories.id")?,
        user_id: parse_uuid(&user_text, "stories.user_id")?,
        content: row.get("content")?,
        media_url: row.get("media_url")?,
        media_type: row.get("media_type")?,
        like_count: row.get("like_count")?,
        comment_count: row.get("comment_count")?,
        view_count: row.get("view_count")?,
        expires_at: row.get("expires_at")?,
        created_at: row.get("created_at")?,
    };
    story.validate()?;
    Ok(story)
}
