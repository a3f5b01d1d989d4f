//! Comment repository.
//!
//! # Invariants
//! - Adding a comment increments the target's `comment_count` in the same
//!   transaction.

use crate::model::engagement::{Comment, EngagementTarget, NewComment};
use crate::model::now_epoch_ms;
use crate::realtime::{ChangeKind, Table};
use crate::repo::{parse_opt_uuid, parse_uuid, RepoError, RepoResult, SqliteStore};
use rusqlite::{params, Row};
use uuid::Uuid;

/// Repository interface for comments on posts and stories.
pub trait CommentRepository {
    fn add_comment(&self, comment: &NewComment) -> RepoResult<Comment>;
    /// Comments on one target, oldest first.
    fn list_comments(&self, target: EngagementTarget) -> RepoResult<Vec<Comment>>;
}

impl CommentRepository for SqliteStore<'_> {
    fn add_comment(&self, comment: &NewComment) -> RepoResult<Comment> {
        comment.validate()?;
        let id = Uuid::new_v4();
        let now = now_epoch_ms();
        let (post_id, story_id) = comment.target.columns();
        let content = comment.content.trim().to_string();

        let tx = self.begin()?;
        let changed = tx.execute(
            counter_sql(comment.target),
            [comment.target.id().to_string()],
        )?;
        if changed == 0 {
            return Err(target_not_found(comment.target));
        }
        tx.execute(
            "INSERT INTO comments (id, user_id, post_id, story_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id.to_string(),
                comment.user_id.to_string(),
                post_id.map(|value| value.to_string()),
                story_id.map(|value| value.to_string()),
                content.as_str(),
                now,
            ],
        )?;
        tx.commit()?;

        let stored = Comment {
            id,
            user_id: comment.user_id,
            target: comment.target,
            content,
            created_at: now,
        };
        self.publish(Table::Comments, ChangeKind::Insert, id, &stored);
        Ok(stored)
    }

    fn list_comments(&self, target: EngagementTarget) -> RepoResult<Vec<Comment>> {
        let sql = match target {
            EngagementTarget::Post(_) => {
                "SELECT id, user_id, post_id, story_id, content, created_at
                 FROM comments WHERE post_id = ?1
                 ORDER BY created_at ASC, rowid ASC;"
            }
            EngagementTarget::Story(_) => {
                "SELECT id, user_id, post_id, story_id, content, created_at
                 FROM comments WHERE story_id = ?1
                 ORDER BY created_at ASC, rowid ASC;"
            }
        };
        let mut stmt = self.conn().prepare_cached(sql)?;
        let mut rows = stmt.query([target.id().to_string()])?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(parse_comment_row(row)?);
        }
        Ok(comments)
    }
}

fn counter_sql(target: EngagementTarget) -> &'static str {
    match target {
        EngagementTarget::Post(_) => {
            "UPDATE posts SET comment_count = comment_count + 1 WHERE id = ?1;"
        }
        EngagementTarget::Story(_) => {
            "UPDATE stories SET comment_count = comment_count + 1 WHERE id = ?1;"
        }
    }
}

pub(crate) fn target_not_found(target: EngagementTarget) -> RepoError {
    match target {
        EngagementTarget::Post(id) => RepoError::NotFound { entity: "post", id },
        EngagementTarget::Story(id) => RepoError::NotFound {
            entity: "story",
            id,
        },
    }
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<Comment> {
    let id_text: String = row.get("id")?;
    let user_text: String = row.get("user_id")?;
    let post_id = parse_opt_uuid(row.get("post_id")?, "comments.post_id")?;
    let story_id = parse_opt_uuid(row.get("story_id")?, "comments.story_id")?;
    Ok(Comment {
        id: parse_uuid(&id_text, "comments.id")?,
        user_id: parse_uuid(&user_text, "comments.user_id")?,
        target: EngagementTarget::from_columns(post_id, story_id)?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
    })
}
