//! Post composer and engagement actions.
//!
//! # Responsibility
//! - Upload media, parse hashtags and insert posts.
//! - Like/unlike, comment, count views and delete own posts.
//! - Sell boosts for coins.
//!
//! # Invariants
//! - Media is uploaded only after the draft passed validation.
//! - Likes and comments on another profile's post notify its author.

use crate::model::engagement::{Comment, EngagementTarget, NewComment};
use crate::model::enums::{MediaType, NotificationType};
use crate::model::post::{NewPost, Post, PostId};
use crate::model::profile::ProfileId;
use crate::model::validation::ModelValidationError;
use crate::model::HOUR_MS;
use crate::repo::comment_repo::CommentRepository;
use crate::repo::like_repo::LikeRepository;
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::post_repo::PostRepository;
use crate::repo::profile_repo::ProfileRepository;
use crate::repo::wallet_repo::WalletRepository;
use crate::service::{notify_activity, MediaRejection, ServiceError, ServiceResult};
use crate::storage::{BlobStore, MediaUpload, MEDIA_BUCKET};
use log::{info, warn};
use std::time::Instant;

pub const BOOST_COST_COINS: i64 = 50;
pub const BOOST_DURATION_MS: i64 = 24 * HOUR_MS;

/// Composer input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub content: String,
    /// Raw hashtag field, e.g. `"#rust #food"`.
    pub hashtags: String,
    /// Stored only when media is attached.
    pub media_type: MediaType,
    pub media: Option<MediaUpload>,
}

/// Like state after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeToggle {
    pub liked: bool,
    pub like_count: i64,
}

/// Splits on `#`, trims, drops empties and duplicates keeping first order.
pub fn parse_hashtags(input: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in input.split('#').map(str::trim).filter(|tag| !tag.is_empty()) {
        if !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

pub struct PostService<R, B> {
    repo: R,
    blobs: B,
    bucket: String,
}

impl<R, B> PostService<R, B>
where
    R: PostRepository
        + ProfileRepository
        + LikeRepository
        + CommentRepository
        + NotificationRepository
        + WalletRepository,
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

    /// Publishes a post for `viewer`, uploading attached media first.
    pub fn create_post(&self, viewer: ProfileId, draft: PostDraft, now_ms: i64) -> ServiceResult<Post> {
        let started_at = Instant::now();
        let content = Some(draft.content.trim().to_string()).filter(|text| !text.is_empty());
        if content.is_none() && draft.media.is_none() {
            return Err(ServiceError::InvalidInput(
                ModelValidationError::EmptyPost.to_string(),
            ));
        }
        if let Some(media) = draft.media.as_ref() {
            if media.bytes.is_empty() {
                return Err(ServiceError::InvalidMedia(MediaRejection::Empty));
            }
        }

        let hashtags = parse_hashtags(&draft.hashtags);
        let uploaded = match draft.media.as_ref() {
            Some(media) => {
                let path = media.timestamped_path(viewer, now_ms);
                self.blobs.upload(
                    &self.bucket,
                    &path,
                    &media.bytes,
                    &media.content_type,
                    false,
                )?;
                Some(path)
            }
            None => None,
        };

        let new_post = NewPost {
            user_id: viewer,
            content,
            media_url: uploaded
                .as_deref()
                .map(|path| self.blobs.public_url(&self.bucket, path)),
            media_type: uploaded.as_ref().map(|_| draft.media_type),
            hashtags: Some(hashtags).filter(|tags| !tags.is_empty()),
            created_at: now_ms,
        };
        let post = match self.repo.create_post(&new_post) {
            Ok(post) => post,
            Err(err) => {
                if let Some(path) = uploaded.as_deref() {
                    if let Err(cleanup) = self.blobs.remove(&self.bucket, path) {
                        warn!(
                            "event=post_create module=service status=cleanup_failed error={cleanup}"
                        );
                    }
                }
                return Err(err.into());
            }
        };

        info!(
            "event=post_create module=service status=ok post_id={} has_media={} hashtags={} duration_ms={}",
            post.id,
            post.media_url.is_some(),
            post.hashtags.as_ref().map_or(0, Vec::len),
            started_at.elapsed().as_millis()
        );
        Ok(post)
    }

    /// Likes the post if the viewer has not, otherwise unlikes it.
    pub fn toggle_like(&self, viewer: ProfileId, post_id: PostId) -> ServiceResult<LikeToggle> {
        let post = self.require_post(post_id)?;
        let target = EngagementTarget::Post(post_id);
        if self.repo.has_liked(viewer, target)? {
            let outcome = self.repo.unlike(viewer, target)?;
            return Ok(LikeToggle {
                liked: false,
                like_count: outcome.like_count,
            });
        }

        let outcome = self.repo.like(viewer, target)?;
        if outcome.changed {
            notify_activity(
                &self.repo,
                post.user_id,
                viewer,
                NotificationType::Like,
                Some(post_id),
            );
        }
        Ok(LikeToggle {
            liked: true,
            like_count: outcome.like_count,
        })
    }

    pub fn comment(&self, viewer: ProfileId, post_id: PostId, text: &str) -> ServiceResult<Comment> {
        let post = self.require_post(post_id)?;
        let comment = self.repo.add_comment(&NewComment {
            user_id: viewer,
            target: EngagementTarget::Post(post_id),
            content: text.to_string(),
        })?;
        notify_activity(
            &self.repo,
            post.user_id,
            viewer,
            NotificationType::Comment,
            Some(post_id),
        );
        Ok(comment)
    }

    pub fn comments(&self, post_id: PostId) -> ServiceResult<Vec<Comment>> {
        Ok(self.repo.list_comments(EngagementTarget::Post(post_id))?)
    }

    /// Counts one view and returns the new total.
    pub fn record_view(&self, post_id: PostId) -> ServiceResult<i64> {
        Ok(self.repo.increment_post_views(post_id)?)
    }

    /// Deletes a post owned by the viewer and its stored media.
    pub fn delete_post(&self, viewer: ProfileId, post_id: PostId) -> ServiceResult<()> {
        let post = self.require_post(post_id)?;
        if post.user_id != viewer {
            return Err(ServiceError::Forbidden("delete this post"));
        }
        self.repo.delete_post(post_id, viewer)?;
        if let Some(path) = post.media_url.as_deref().and_then(|url| self.object_path(url)) {
            if let Err(err) = self.blobs.remove(&self.bucket, &path) {
                warn!("event=post_delete module=service status=media_orphaned error={err}");
            }
        }
        info!("event=post_delete module=service status=ok post_id={post_id}");
        Ok(())
    }

    /// Charges the owner and keeps the post boosted for 24 more hours.
    pub fn boost_post(&self, viewer: ProfileId, post_id: PostId, now_ms: i64) -> ServiceResult<Post> {
        let post = self.require_post(post_id)?;
        if post.user_id != viewer {
            return Err(ServiceError::Forbidden("boost this post"));
        }
        let boosted =
            self.repo
                .boost_post(viewer, post_id, BOOST_COST_COINS, now_ms, BOOST_DURATION_MS)?;
        info!(
            "event=post_boost module=service status=ok post_id={} expires_at={}",
            post_id,
            boosted.boost_expires_at.unwrap_or_default()
        );
        Ok(boosted)
    }

    fn require_post(&self, post_id: PostId) -> ServiceResult<Post> {
        self.repo.get_post(post_id)?.ok_or(ServiceError::NotFound {
            entity: "post",
            id: post_id,
        })
    }

    /// Recovers the object path from a public URL issued by this store.
    fn object_path(&self, url: &str) -> Option<String> {
        let prefix = self.blobs.public_url(&self.bucket, "");
        url.strip_prefix(prefix.as_str())
            .filter(|path| !path.is_empty())
            .map(str::to_string)
    }
}
