//! Settings screen: profile fields, avatar, theme and VIP upgrade.

use crate::model::enums::ThemeType;
use crate::model::profile::{Profile, ProfileId, ProfileUpdate};
use crate::repo::profile_repo::ProfileRepository;
use crate::repo::wallet_repo::WalletRepository;
use crate::repo::RepoError;
use crate::service::{MediaRejection, ServiceError, ServiceResult};
use crate::storage::{BlobStore, MediaUpload, MEDIA_BUCKET};
use log::info;

pub const VIP_COST_COINS: i64 = 500;
pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

pub struct SettingsService<R, B> {
    repo: R,
    blobs: B,
    bucket: String,
}

impl<R, B> SettingsService<R, B>
where
    R: ProfileRepository + WalletRepository,
    B: BlobStore,
{
    pub fn new(repo: R, blobs: B) -> Self {
        Self::with_bucket(repo, blobs, MEDIA_BUCKET)
    }

    pub fn with_bucket(repo: R, blobs: B, bucket: impl Into<String>) -> Self {
        Self {
            repo,
            blobs,
            bucket: bucket.into(),
        }
    }

    /// Applies the edited form fields; an empty update is a no-op read.
    pub fn update_profile(&self, viewer: ProfileId, update: &ProfileUpdate) -> ServiceResult<Profile> {
        if update.is_empty() {
            return self.require_profile(viewer);
        }
        let profile = self.repo.update_profile(viewer, update).map_err(conflict_to_input)?;
        info!("event=profile_update module=service status=ok profile_id={viewer}");
        Ok(profile)
    }

    /// Replaces the avatar with an image of at most 5 MiB.
    pub fn change_avatar(&self, viewer: ProfileId, upload: &MediaUpload) -> ServiceResult<Profile> {
        check_avatar(upload)?;
        let path = upload.avatar_path(viewer);
        self.blobs
            .upload(&self.bucket, &path, &upload.bytes, &upload.content_type, true)?;
        let url = self.blobs.public_url(&self.bucket, &path);
        let profile = self.repo.update_profile(
            viewer,
            &ProfileUpdate {
                avatar_url: Some(Some(url)),
                ..ProfileUpdate::default()
            },
        )?;
        info!(
            "event=avatar_change module=service status=ok profile_id={} bytes={}",
            viewer,
            upload.bytes.len()
        );
        Ok(profile)
    }

    pub fn change_theme(&self, viewer: ProfileId, theme: ThemeType) -> ServiceResult<Profile> {
        Ok(self.repo.update_profile(
            viewer,
            &ProfileUpdate {
                theme: Some(theme),
                ..ProfileUpdate::default()
            },
        )?)
    }

    /// Spends 500 coins for VIP status and the VIP badge.
    pub fn upgrade_to_vip(&self, viewer: ProfileId) -> ServiceResult<Profile> {
        let profile = self.require_profile(viewer)?;
        if profile.is_vip {
            return Err(ServiceError::AlreadyVip);
        }
        if profile.coins < VIP_COST_COINS {
            return Err(ServiceError::InsufficientCoins {
                required: VIP_COST_COINS,
                available: profile.coins,
            });
        }
        let upgraded = match self.repo.upgrade_to_vip(viewer, VIP_COST_COINS) {
            Ok(profile) => profile,
            Err(RepoError::Conflict(_)) => return Err(ServiceError::AlreadyVip),
            Err(err) => return Err(err.into()),
        };
        info!(
            "event=vip_upgrade module=service status=ok profile_id={} coins_left={}",
            viewer, upgraded.coins
        );
        Ok(upgraded)
    }

    fn require_profile(&self, viewer: ProfileId) -> ServiceResult<Profile> {
        self.repo.get_profile(viewer)?.ok_or(ServiceError::NotFound {
            entity: "profile",
            id: viewer,
        })
    }
}

fn check_avatar(upload: &MediaUpload) -> ServiceResult<()> {
    if !upload.is_image() {
        return Err(ServiceError::InvalidMedia(MediaRejection::NotAnImage));
    }
    if upload.bytes.is_empty() {
        return Err(ServiceError::InvalidMedia(MediaRejection::Empty));
    }
    if upload.bytes.len() > MAX_AVATAR_BYTES {
        return Err(ServiceError::InvalidMedia(MediaRejection::TooLarge {
            max_bytes: MAX_AVATAR_BYTES,
        }));
    }
    Ok(())
}

fn conflict_to_input(err: RepoError) -> ServiceError {
    match err {
        RepoError::Conflict(message) => ServiceError::InvalidInput(message),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::{check_avatar, MAX_AVATAR_BYTES};
    use crate::service::{MediaRejection, ServiceError};
    use crate::storage::MediaUpload;

    #[test]
    fn avatar_must_be_a_small_image() {
        assert!(check_avatar(&MediaUpload::new("a.png", "image/png", vec![0; 10])).is_ok());
        assert!(matches!(
            check_avatar(&MediaUpload::new("a.mp4", "video/mp4", vec![0; 10])),
            Err(ServiceError::InvalidMedia(MediaRejection::NotAnImage))
        ));
        assert!(matches!(
            check_avatar(&MediaUpload::new(
                "a.png",
                "image/png",
                vec![0; MAX_AVATAR_BYTES + 1]
            )),
            Err(ServiceError::InvalidMedia(MediaRejection::TooLarge { .. }))
        ));
        assert!(check_avatar(&MediaUpload::new("a.png", "image/png", vec![0; MAX_AVATAR_BYTES])).is_ok());
    }
}
