//! Banner ad repository.

use crate::model::banner::{BannerAd, NewBannerAd};
use crate::model::now_epoch_ms;
use crate::model::validation::require_text;
use crate::realtime::{ChangeKind, Table};
use crate::repo::{bool_to_int, parse_bool, parse_uuid, RepoError, RepoResult, SqliteStore};
use rusqlite::{params, Row};
use uuid::Uuid;

const BANNER_SELECT_SQL: &str = "SELECT
    id,
    title,
    image_url,
    link_url,
    is_active,
    created_at
FROM banner_ads";

/// Repository interface for promotional banners.
pub trait BannerAdRepository {
    fn create_banner(&self, banner: &NewBannerAd) -> RepoResult<BannerAd>;
    /// Active banners, newest first.
    fn list_active_banners(&self) -> RepoResult<Vec<BannerAd>>;
    fn set_banner_active(&self, id: Uuid, active: bool) -> RepoResult<()>;
}

impl BannerAdRepository for SqliteStore<'_> {
    fn create_banner(&self, banner: &NewBannerAd) -> RepoResult<BannerAd> {
        require_text("banner title", &banner.title)?;
        require_text("banner image url", &banner.image_url)?;
        let id = Uuid::new_v4();
        let now = now_epoch_ms();
        self.conn().execute(
            "INSERT INTO banner_ads (id, title, image_url, link_url, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5);",
            params![
                id.to_string(),
                banner.title.trim(),
                banner.image_url.trim(),
                banner.link_url.as_deref(),
                now,
            ],
        )?;
        let stored = BannerAd {
            id,
            title: banner.title.trim().to_string(),
            image_url: banner.image_url.trim().to_string(),
            link_url: banner.link_url.clone(),
            is_active: true,
            created_at: now,
        };
        self.publish(Table::BannerAds, ChangeKind::Insert, id, &stored);
        Ok(stored)
    }

    fn list_active_banners(&self) -> RepoResult<Vec<BannerAd>> {
        let mut stmt = self.conn().prepare_cached(&format!(
            "{BANNER_SELECT_SQL} WHERE is_active = 1 ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut banners = Vec::new();
        while let Some(row) = rows.next()? {
            banners.push(parse_banner_row(row)?);
        }
        Ok(banners)
    }

    fn set_banner_active(&self, id: Uuid, active: bool) -> RepoResult<()> {
        let changed = self.conn().execute(
            "UPDATE banner_ads SET is_active = ?2 WHERE id = ?1;",
            params![id.to_string(), bool_to_int(active)],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "banner",
                id,
            });
        }
        let mut stmt = self
            .conn()
            .prepare_cached(&format!("{BANNER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let banner = parse_banner_row(row)?;
            self.publish(Table::BannerAds, ChangeKind::Update, id, &banner);
        }
        Ok(())
    }
}

fn parse_banner_row(row: &Row<'_>) -> RepoResult<BannerAd> {
    let id_text: String = row.get("id")?;
    Ok(BannerAd {
        id: parse_uuid(&id_text, "banner_ads.id")?,
        title: row.get("title")?,
        image_url: row.get("image_url")?,
        link_url: row.get("link_url")?,
        is_active: parse_bool(row.get("is_active")?, "banner_ads.is_active")?,
        created_at: row.get("created_at")?,
    })
}
