//! Coin balance operations.
//!
//! # Invariants
//! - Every debit checks the balance inside the same transaction as the
//!   effect it pays for; a short balance fails with
//!   `RepoError::InsufficientCoins` and changes nothing.
//! - Balances never go negative.

use crate::model::enums::BadgeType;
use crate::model::now_epoch_ms;
use crate::model::post::{Post, PostId};
use crate::model::profile::{Profile, ProfileId};
use crate::model::tip::{NewTip, Tip};
use crate::model::validation::ModelValidationError;
use crate::realtime::{ChangeKind, Table};
use crate::repo::badge_repo::insert_badge;
use crate::repo::post_repo::PostRepository;
use crate::repo::profile_repo::ProfileRepository;
use crate::repo::{RepoError, RepoResult, SqliteStore};
use rusqlite::{params, OptionalExtension, Transaction};
use uuid::Uuid;

/// Repository interface for coin transfers and purchases.
pub trait WalletRepository {
    /// Moves `amount` coins from sender to receiver and records the tip.
    fn send_tip(&self, tip: &NewTip) -> RepoResult<Tip>;
    /// Charges `cost` to the post owner and opens or extends the boost
    /// window by `duration_ms`.
    fn boost_post(
        &self,
        owner: ProfileId,
        post_id: PostId,
        cost: i64,
        now_ms: i64,
        duration_ms: i64,
    ) -> RepoResult<Post>;
    /// Charges `cost`, sets `is_vip` and grants the VIP badge.
    fn upgrade_to_vip(&self, user: ProfileId, cost: i64) -> RepoResult<Profile>;
    /// Adds coins to a balance, e.g. from a purchase or a reward.
    fn credit_coins(&self, user: ProfileId, amount: i64) -> RepoResult<Profile>;
}

impl WalletRepository for SqliteStore<'_> {
    fn send_tip(&self, tip: &NewTip) -> RepoResult<Tip> {
        tip.validate()?;
        let id = Uuid::new_v4();
        let now = now_epoch_ms();
        let message = tip
            .message
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        let tx = self.begin()?;
        ensure_profile(&tx, tip.receiver_id)?;
        debit(&tx, tip.sender_id, tip.amount)?;
        tx.execute(
            "UPDATE profiles SET coins = coins + ?2 WHERE id = ?1;",
            params![tip.receiver_id.to_string(), tip.amount],
        )?;
        tx.execute(
            "INSERT INTO tips (id, sender_id, receiver_id, post_id, amount, message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                id.to_string(),
                tip.sender_id.to_string(),
                tip.receiver_id.to_string(),
                tip.post_id.map(|value| value.to_string()),
                tip.amount,
                message.as_deref(),
                now,
            ],
        )?;
        tx.commit()?;

        let stored = Tip {
            id,
            sender_id: tip.sender_id,
            receiver_id: tip.receiver_id,
            post_id: tip.post_id,
            amount: tip.amount,
            message,
            created_at: now,
        };
        self.publish(Table::Tips, ChangeKind::Insert, id, &stored);
        self.publish_profile(tip.sender_id)?;
        self.publish_profile(tip.receiver_id)?;
        Ok(stored)
    }

    fn boost_post(
        &self,
        owner: ProfileId,
        post_id: PostId,
        cost: i64,
        now_ms: i64,
        duration_ms: i64,
    ) -> RepoResult<Post> {
        if cost <= 0 {
            return Err(ModelValidationError::NonPositiveAmount(cost).into());
        }

        let tx = self.begin()?;
        let current: Option<(String, i64, Option<i64>)> = tx
            .query_row(
                "SELECT user_id, is_boosted, boost_expires_at FROM posts WHERE id = ?1;",
                [post_id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        let (user_text, is_boosted, expires_at) = current.ok_or(RepoError::NotFound {
            entity: "post",
            id: post_id,
        })?;
        if user_text != owner.to_string() {
            return Err(RepoError::NotFound {
                entity: "post",
                id: post_id,
            });
        }

        let window_start = match expires_at {
            Some(expires) if is_boosted == 1 && expires > now_ms => expires,
            _ => now_ms,
        };
        debit(&tx, owner, cost)?;
        tx.execute(
            "UPDATE posts SET is_boosted = 1, boost_expires_at = ?2 WHERE id = ?1;",
            params![post_id.to_string(), window_start + duration_ms],
        )?;
        tx.commit()?;

        let post = self.get_post(post_id)?.ok_or(RepoError::NotFound {
            entity: "post",
            id: post_id,
        })?;
        self.publish(Table::Posts, ChangeKind::Update, post_id, &post);
        self.publish_profile(owner)?;
        Ok(post)
    }

    fn upgrade_to_vip(&self, user: ProfileId, cost: i64) -> RepoResult<Profile> {
        let tx = self.begin()?;
        let is_vip: i64 = tx
            .query_row(
                "SELECT is_vip FROM profiles WHERE id = ?1;",
                [user.to_string()],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(RepoError::NotFound {
                entity: "profile",
                id: user,
            })?;
        if is_vip == 1 {
            return Err(RepoError::Conflict("profile is already VIP".to_string()));
        }

        debit(&tx, user, cost)?;
        tx.execute(
            "UPDATE profiles SET is_vip = 1, updated_at = ?2 WHERE id = ?1;",
            params![user.to_string(), now_epoch_ms()],
        )?;
        let badge = insert_badge(&tx, user, BadgeType::Vip)?;
        tx.commit()?;

        if let Some(badge) = badge {
            self.publish(Table::UserBadges, ChangeKind::Insert, badge.id, &badge);
        }
        self.publish_profile(user)
    }

    fn credit_coins(&self, user: ProfileId, amount: i64) -> RepoResult<Profile> {
        if amount <= 0 {
            return Err(ModelValidationError::NonPositiveAmount(amount).into());
        }
        let changed = self.conn().execute(
            "UPDATE profiles SET coins = coins + ?2 WHERE id = ?1;",
            params![user.to_string(), amount],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "profile",
                id: user,
            });
        }
        self.publish_profile(user)
    }
}

impl SqliteStore<'_> {
    fn publish_profile(&self, id: ProfileId) -> RepoResult<Profile> {
        let profile = self.get_profile(id)?.ok_or(RepoError::NotFound {
            entity: "profile",
            id,
        })?;
        self.publish(Table::Profiles, ChangeKind::Update, id, &profile);
        Ok(profile)
    }
}

/// Subtracts `amount` from `user` when the balance covers it.
fn debit(tx: &Transaction<'_>, user: ProfileId, amount: i64) -> RepoResult<()> {
    let changed = tx.execute(
        "UPDATE profiles SET coins = coins - ?2 WHERE id = ?1 AND coins >= ?2;",
        params![user.to_string(), amount],
    )?;
    if changed > 0 {
        return Ok(());
    }
    let available: i64 = tx
        .query_row(
            "SELECT coins FROM profiles WHERE id = ?1;",
            [user.to_string()],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(RepoError::NotFound {
            entity: "profile",
            id: user,
        })?;
    Err(RepoError::InsufficientCoins {
        required: amount,
        available,
    })
}

fn ensure_profile(tx: &Transaction<'_>, id: ProfileId) -> RepoResult<()> {
    tx.query_row("SELECT 1 FROM profiles WHERE id = ?1;", [id.to_string()], |_| Ok(()))
        .optional()?
        .ok_or(RepoError::NotFound {
            entity: "profile",
            id,
        })
}
