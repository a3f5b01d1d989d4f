//! Profile repository.
//!
//! # Invariants
//! - Usernames are unique; a clash surfaces as `RepoError::Conflict`.
//! - Counter and coin columns are never written through this trait; they
//!   change only through follow/wallet operations.

use crate::model::enums::ThemeType;
use crate::model::profile::{NewProfile, Profile, ProfileId, ProfileUpdate};
use crate::model::views::AuthorSummary;
use crate::model::now_epoch_ms;
use crate::realtime::{ChangeKind, Table};
use crate::repo::{
    map_conflict, parse_bool, parse_enum, parse_uuid, RepoError, RepoResult, SqliteStore,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::HashMap;

pub(crate) const PROFILE_SELECT_SQL: &str = "SELECT
    id,
    username,
    full_name,
    bio,
    avatar_url,
    coins,
    follower_count,
    following_count,
    is_vip,
    theme,
    created_at,
    updated_at
FROM profiles";

const SEARCH_LIMIT: u32 = 20;

/// Repository interface for profile records.
pub trait ProfileRepository {
    fn create_profile(&self, profile: &NewProfile) -> RepoResult<Profile>;
    fn get_profile(&self, id: ProfileId) -> RepoResult<Option<Profile>>;
    fn get_profile_by_username(&self, username: &str) -> RepoResult<Option<Profile>>;
    /// Applies a partial update and returns the stored row.
    fn update_profile(&self, id: ProfileId, update: &ProfileUpdate) -> RepoResult<Profile>;
    /// Loads author summaries for many ids; unknown ids are skipped.
    fn author_summaries(&self, ids: &[ProfileId]) -> RepoResult<HashMap<ProfileId, AuthorSummary>>;
    /// Case-insensitive username prefix search.
    fn search_profiles(&self, prefix: &str) -> RepoResult<Vec<Profile>>;
}

impl ProfileRepository for SqliteStore<'_> {
    fn create_profile(&self, profile: &NewProfile) -> RepoResult<Profile> {
        let stored = insert_profile(self.conn(), profile)?;
        self.publish(Table::Profiles, ChangeKind::Insert, stored.id, &stored);
        Ok(stored)
    }

    fn get_profile(&self, id: ProfileId) -> RepoResult<Option<Profile>> {
        let mut stmt = self
            .conn()
            .prepare_cached(&format!("{PROFILE_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt
            .query_row([id.to_string()], |row| Ok(parse_profile_row(row)))
            .optional()?;
        row.transpose()
    }

    fn get_profile_by_username(&self, username: &str) -> RepoResult<Option<Profile>> {
        let mut stmt = self.conn().prepare_cached(&format!(
            "{PROFILE_SELECT_SQL} WHERE username = ?1 COLLATE NOCASE;"
        ))?;
        let row = stmt
            .query_row([username.trim()], |row| Ok(parse_profile_row(row)))
            .optional()?;
        row.transpose()
    }

    fn update_profile(&self, id: ProfileId, update: &ProfileUpdate) -> RepoResult<Profile> {
        let update = update.clone().normalize()?;
        let mut assignments: Vec<&'static str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(username) = update.username.as_ref() {
            assignments.push("username = ?");
            bind_values.push(Value::Text(username.clone()));
        }
        if let Some(full_name) = update.full_name.as_ref() {
            assignments.push("full_name = ?");
            bind_values.push(optional_text(full_name));
        }
        if let Some(bio) = update.bio.as_ref() {
            assignments.push("bio = ?");
            bind_values.push(optional_text(bio));
        }
        if let Some(avatar_url) = update.avatar_url.as_ref() {
            assignments.push("avatar_url = ?");
            bind_values.push(optional_text(avatar_url));
        }
        if let Some(theme) = update.theme {
            assignments.push("theme = ?");
            bind_values.push(Value::Text(theme.as_str().to_string()));
        }
        assignments.push("updated_at = ?");
        bind_values.push(Value::Integer(now_epoch_ms()));
        bind_values.push(Value::Text(id.to_string()));

        let sql = format!(
            "UPDATE profiles SET {} WHERE id = ?;",
            assignments.join(", ")
        );
        let changed = self
            .conn()
            .execute(&sql, params_from_iter(bind_values))
            .map_err(|err| {
                map_conflict(err, || {
                    format!(
                        "username `{}` is taken",
                        update.username.as_deref().unwrap_or_default()
                    )
                })
            })?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "profile",
                id,
            });
        }

        let stored = self.get_profile(id)?.ok_or(RepoError::NotFound {
            entity: "profile",
            id,
        })?;
        self.publish(Table::Profiles, ChangeKind::Update, id, &stored);
        Ok(stored)
    }

    fn author_summaries(&self, ids: &[ProfileId]) -> RepoResult<HashMap<ProfileId, AuthorSummary>> {
        let mut summaries = HashMap::with_capacity(ids.len());
        let mut stmt = self.conn().prepare_cached(
            "SELECT id, username, full_name, avatar_url FROM profiles WHERE id = ?1;",
        )?;
        for id in ids {
            if summaries.contains_key(id) {
                continue;
            }
            let summary = stmt
                .query_row([id.to_string()], |row| {
                    Ok((
                        row.get::<_, String>("username")?,
                        row.get::<_, Option<String>>("full_name")?,
                        row.get::<_, Option<String>>("avatar_url")?,
                    ))
                })
                .optional()?;
            if let Some((username, full_name, avatar_url)) = summary {
                summaries.insert(
                    *id,
                    AuthorSummary {
                        id: *id,
                        username,
                        full_name,
                        avatar_url,
                    },
                );
            }
        }
        Ok(summaries)
    }

    fn search_profiles(&self, prefix: &str) -> RepoResult<Vec<Profile>> {
        let prefix = prefix.trim().to_lowercase();
        if prefix.is_empty() {
            return Ok(Vec::new());
        }
        let pattern = format!("{}%", escape_like(&prefix));
        let mut stmt = self.conn().prepare_cached(&format!(
            "{PROFILE_SELECT_SQL}
             WHERE username LIKE ?1 ESCAPE '\\'
             ORDER BY follower_count DESC, username ASC
             LIMIT ?2;"
        ))?;
        let mut rows = stmt.query(params![pattern, i64::from(SEARCH_LIMIT)])?;
        let mut profiles = Vec::new();
        while let Some(row) = rows.next()? {
            profiles.push(parse_profile_row(row)?);
        }
        Ok(profiles)
    }
}

/// Inserts a fresh profile row with zeroed counters.
pub(crate) fn insert_profile(conn: &Connection, profile: &NewProfile) -> RepoResult<Profile> {
    let profile = profile.clone().normalize()?;
    let now = now_epoch_ms();
    conn.execute(
        "INSERT INTO profiles (id, username, full_name, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4);",
        params![
            profile.id.to_string(),
            profile.username.as_str(),
            profile.full_name.as_deref(),
            now,
        ],
    )
    .map_err(|err| map_conflict(err, || format!("username `{}` is taken", profile.username)))?;

    Ok(Profile {
        id: profile.id,
        username: profile.username,
        full_name: profile.full_name,
        bio: None,
        avatar_url: None,
        coins: 0,
        follower_count: 0,
        following_count: 0,
        is_vip: false,
        theme: ThemeType::Default,
        created_at: now,
        updated_at: now,
    })
}

pub(crate) fn parse_profile_row(row: &Row<'_>) -> RepoResult<Profile> {
    let id_text: String = row.get("id")?;
    let theme_text: String = row.get("theme")?;
    let profile = Profile {
        id: parse_uuid(&id_text, "profiles.id")?,
        username: row.get("username")?,
        full_name: row.get("full_name")?,
        bio: row.get("bio")?,
        avatar_url: row.get("avatar_url")?,
        coins: row.get("coins")?,
        follower_count: row.get("follower_count")?,
        following_count: row.get("following_count")?,
        is_vip: parse_bool(row.get("is_vip")?, "profiles.is_vip")?,
        theme: parse_enum(&theme_text, "profiles.theme", ThemeType::parse)?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    profile.validate()?;
    Ok(profile)
}

/// Escapes `%`, `_` and `\` for `LIKE ... ESCAPE '\'`.
pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn optional_text(value: &Option<String>) -> Value {
    match value {
        Some(text) => Value::Text(text.clone()),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
