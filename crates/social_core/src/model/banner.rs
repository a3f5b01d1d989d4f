//! Promotional banner records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted `banner_ads` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerAd {
    pub id: Uuid,
    pub title: String,
    pub image_url: String,
    pub link_url: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
}

/// Insert model for a banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBannerAd {
    pub title: String,
    pub image_url: String,
    pub link_url: Option<String>,
}
