//! Follow-edge repository.
//!
//! # Invariants
//! - Following adjusts `follower_count` on the target and `following_count`
//!   on the follower in the same transaction, only when an edge changed.
//! - Self-follows are rejected before SQL.

use crate::model::engagement::Follow;
use crate::model::now_epoch_ms;
use crate::model::profile::ProfileId;
use crate::model::validation::ModelValidationError;
use crate::realtime::{ChangeKind, Table};
use crate::repo::{parse_uuid, RepoError, RepoResult, SqliteStore};
use rusqlite::{params, OptionalExtension, Transaction};
use uuid::Uuid;

/// Result of a follow/unfollow call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowOutcome {
    pub changed: bool,
    /// Target's `follower_count` after the call.
    pub follower_count: i64,
}

/// Repository interface for the follow graph.
pub trait FollowRepository {
    fn follow(&self, follower: ProfileId, following: ProfileId) -> RepoResult<FollowOutcome>;
    fn unfollow(&self, follower: ProfileId, following: ProfileId) -> RepoResult<FollowOutcome>;
    fn is_following(&self, follower: ProfileId, following: ProfileId) -> RepoResult<bool>;
    /// Profiles `user` follows, most recent first.
    fn following_ids(&self, user: ProfileId) -> RepoResult<Vec<ProfileId>>;
    /// Profiles following `user`, most recent first.
    fn follower_ids(&self, user: ProfileId) -> RepoResult<Vec<ProfileId>>;
}

impl FollowRepository for SqliteStore<'_> {
    fn follow(&self, follower: ProfileId, following: ProfileId) -> RepoResult<FollowOutcome> {
        if follower == following {
            return Err(ModelValidationError::SelfTarget("follow").into());
        }
        let id = Uuid::new_v4();
        let now = now_epoch_ms();

        let tx = self.begin()?;
        ensure_profile(&tx, follower)?;
        ensure_profile(&tx, following)?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO follows (id, follower_id, following_id, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![id.to_string(), follower.to_string(), following.to_string(), now],
        )?;
        if inserted > 0 {
            tx.execute(
                "UPDATE profiles SET follower_count = follower_count + 1 WHERE id = ?1;",
                [following.to_string()],
            )?;
            tx.execute(
                "UPDATE profiles SET following_count = following_count + 1 WHERE id = ?1;",
                [follower.to_string()],
            )?;
        }
        let follower_count = read_follower_count(&tx, following)?;
        tx.commit()?;

        if inserted > 0 {
            let edge = Follow {
                id,
                follower_id: follower,
                following_id: following,
                created_at: now,
            };
            self.publish(Table::Follows, ChangeKind::Insert, id, &edge);
        }
        Ok(FollowOutcome {
            changed: inserted > 0,
            follower_count,
        })
    }

    fn unfollow(&self, follower: ProfileId, following: ProfileId) -> RepoResult<FollowOutcome> {
        let tx = self.begin()?;
        let removed: Option<(String, i64)> = tx
            .query_row(
                "DELETE FROM follows WHERE follower_id = ?1 AND following_id = ?2
                 RETURNING id, created_at;",
                params![follower.to_string(), following.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        if removed.is_some() {
            tx.execute(
                "UPDATE profiles SET follower_count = MAX(follower_count - 1, 0) WHERE id = ?1;",
                [following.to_string()],
            )?;
            tx.execute(
                "UPDATE profiles SET following_count = MAX(following_count - 1, 0) WHERE id = ?1;",
                [follower.to_string()],
            )?;
        }
        let follower_count = read_follower_count(&tx, following)?;
        tx.commit()?;

        let changed = removed.is_some();
        if let Some((id_text, created_at)) = removed {
            let id = parse_uuid(&id_text, "follows.id")?;
            let edge = Follow {
                id,
                follower_id: follower,
                following_id: following,
                created_at,
            };
            self.publish(Table::Follows, ChangeKind::Delete, id, &edge);
        }
        Ok(FollowOutcome {
            changed,
            follower_count,
        })
    }

    fn is_following(&self, follower: ProfileId, following: ProfileId) -> RepoResult<bool> {
        let exists: i64 = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ?1 AND following_id = ?2);",
            params![follower.to_string(), following.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn following_ids(&self, user: ProfileId) -> RepoResult<Vec<ProfileId>> {
        collect_ids(
            self,
            "SELECT following_id FROM follows WHERE follower_id = ?1
             ORDER BY created_at DESC, rowid DESC;",
            user,
            "follows.following_id",
        )
    }

    fn follower_ids(&self, user: ProfileId) -> RepoResult<Vec<ProfileId>> {
        collect_ids(
            self,
            "SELECT follower_id FROM follows WHERE following_id = ?1
             ORDER BY created_at DESC, rowid DESC;",
            user,
            "follows.follower_id",
        )
    }
}

fn ensure_profile(tx: &Transaction<'_>, id: ProfileId) -> RepoResult<()> {
    tx.query_row("SELECT 1 FROM profiles WHERE id = ?1;", [id.to_string()], |_| Ok(()))
        .optional()?
        .ok_or(RepoError::NotFound {
            entity: "profile",
            id,
        })
}

fn read_follower_count(tx: &Transaction<'_>, id: ProfileId) -> RepoResult<i64> {
    tx.query_row(
        "SELECT follower_count FROM profiles WHERE id = ?1;",
        [id.to_string()],
        |row| row.get(0),
    )
    .optional()?
    .ok_or(RepoError::NotFound {
        entity: "profile",
        id,
    })
}

fn collect_ids(
    store: &SqliteStore<'_>,
    sql: &str,
    user: ProfileId,
    column: &'static str,
) -> RepoResult<Vec<ProfileId>> {
    let mut stmt = store.conn().prepare_cached(sql)?;
    let mut rows = stmt.query([user.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let text: String = row.get(0)?;
        ids.push(parse_uuid(&text, column)?);
    }
    Ok(ids)
}
