//! Tip history reads. Tips are written through
//! [`WalletRepository::send_tip`](crate::repo::wallet_repo::WalletRepository::send_tip).

use crate::model::profile::ProfileId;
use crate::model::tip::Tip;
use crate::repo::{parse_opt_uuid, parse_uuid, RepoResult, SqliteStore};
use rusqlite::Row;

const TIP_SELECT_SQL: &str = "SELECT
    id,
    sender_id,
    receiver_id,
    post_id,
    amount,
    message,
    created_at
FROM tips";

/// Repository interface for tip history.
pub trait TipRepository {
    /// Tips received by `user`, newest first.
    fn list_tips_received(&self, user: ProfileId) -> RepoResult<Vec<Tip>>;
    /// Tips sent by `user`, newest first.
    fn list_tips_sent(&self, user: ProfileId) -> RepoResult<Vec<Tip>>;
    /// Total coins received by `user`; `0` when none.
    fn sum_tips_received(&self, user: ProfileId) -> RepoResult<i64>;
}

impl TipRepository for SqliteStore<'_> {
    fn list_tips_received(&self, user: ProfileId) -> RepoResult<Vec<Tip>> {
        list_tips(
            self,
            &format!(
                "{TIP_SELECT_SQL} WHERE receiver_id = ?1 ORDER BY created_at DESC, rowid DESC;"
            ),
            user,
        )
    }

    fn list_tips_sent(&self, user: ProfileId) -> RepoResult<Vec<Tip>> {
        list_tips(
            self,
            &format!("{TIP_SELECT_SQL} WHERE sender_id = ?1 ORDER BY created_at DESC, rowid DESC;"),
            user,
        )
    }

    fn sum_tips_received(&self, user: ProfileId) -> RepoResult<i64> {
        Ok(self.conn().query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM tips WHERE receiver_id = ?1;",
            [user.to_string()],
            |row| row.get(0),
        )?)
    }
}

fn list_tips(store: &SqliteStore<'_>, sql: &str, user: ProfileId) -> RepoResult<Vec<Tip>> {
    let mut stmt = store.conn().prepare_cached(sql)?;
    let mut rows = stmt.query([user.to_string()])?;
    let mut tips = Vec::new();
    while let Some(row) = rows.next()? {
        tips.push(parse_tip_row(row)?);
    }
    Ok(tips)
}

fn parse_tip_row(row: &Row<'_>) -> RepoResult<Tip> {
    let id_text: String = row.get("id")?;
    let sender_text: String = row.get("sender_id")?;
    let receiver_text: String = row.get("receiver_id")?;
    Ok(Tip {
        id: parse_uuid(&id_text, "tips.id")?,
        sender_id: parse_uuid(&sender_text, "tips.sender_id")?,
        receiver_id: parse_uuid(&receiver_text, "tips.receiver_id")?,
        post_id: parse_opt_uuid(row.get("post_id")?, "tips.post_id")?,
        amount: row.get("amount")?,
        message: row.get("message")?,
        created_at: row.get("created_at")?,
    })
}
