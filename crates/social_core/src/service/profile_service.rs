//! Profile page and follow actions.

use crate::model::badge::UserBadge;
use crate::model::enums::NotificationType;
use crate::model::profile::{Profile, ProfileId};
use crate::model::views::FeedItem;
use crate::repo::badge_repo::BadgeRepository;
use crate::repo::follow_repo::{FollowOutcome, FollowRepository};
use crate::repo::like_repo::LikeRepository;
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::post_repo::{PostListQuery, PostRepository};
use crate::repo::profile_repo::ProfileRepository;
use crate::service::{hydrate_posts, notify_activity, ServiceError, ServiceResult};
use log::info;
use uuid::Uuid;

/// How a profile page is addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileRef {
    Id(ProfileId),
    Username(String),
}

impl ProfileRef {
    /// Parses a UUID, otherwise treats the input as a username (`@` optional).
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        match Uuid::parse_str(value) {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Username(value.trim_start_matches('@').to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePage {
    pub profile: Profile,
    pub badges: Vec<UserBadge>,
    /// Every post by the profile, newest first.
    pub posts: Vec<FeedItem>,
    pub is_following: bool,
    pub is_own: bool,
}

pub struct ProfileService<R> {
    repo: R,
}

impl<R> ProfileService<R>
where
    R: ProfileRepository
        + PostRepository
        + LikeRepository
        + FollowRepository
        + BadgeRepository
        + NotificationRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn resolve(&self, target: &ProfileRef) -> ServiceResult<Profile> {
        match target {
            ProfileRef::Id(id) => self.repo.get_profile(*id)?.ok_or(ServiceError::NotFound {
                entity: "profile",
                id: *id,
            }),
            ProfileRef::Username(username) => self
                .repo
                .get_profile_by_username(username)?
                .ok_or_else(|| ServiceError::UnknownUsername(username.clone())),
        }
    }

    pub fn profile_page(
        &self,
        viewer: Option<ProfileId>,
        target: &ProfileRef,
    ) -> ServiceResult<ProfilePage> {
        let profile = self.resolve(target)?;
        let badges = self.repo.list_badges(profile.id)?;
        let posts = self
            .repo
            .list_posts(&PostListQuery::by_author(profile.id))?;
        let posts = hydrate_posts(&self.repo, viewer, posts)?;
        let is_own = viewer == Some(profile.id);
        let is_following = match viewer {
            Some(viewer) if !is_own => self.repo.is_following(viewer, profile.id)?,
            _ => false,
        };
        Ok(ProfilePage {
            profile,
            badges,
            posts,
            is_following,
            is_own,
        })
    }

    /// Follows `target`; a new edge notifies the target.
    pub fn follow(&self, viewer: ProfileId, target: ProfileId) -> ServiceResult<FollowOutcome> {
        if viewer == target {
            return Err(ServiceError::InvalidInput(
                "you cannot follow yourself".to_string(),
            ));
        }
        let outcome = self.repo.follow(viewer, target)?;
        if outcome.changed {
            notify_activity(&self.repo, target, viewer, NotificationType::Follow, None);
            info!(
                "event=profile_follow module=service status=ok target={} followers={}",
                target, outcome.follower_count
            );
        }
        Ok(outcome)
    }

    pub fn unfollow(&self, viewer: ProfileId, target: ProfileId) -> ServiceResult<FollowOutcome> {
        Ok(self.repo.unfollow(viewer, target)?)
    }

    pub fn search(&self, prefix: &str) -> ServiceResult<Vec<Profile>> {
        Ok(self.repo.search_profiles(prefix)?)
    }
}
