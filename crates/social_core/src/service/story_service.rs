//! Stories: 24-hour media posts.

use crate::model::engagement::{Comment, EngagementTarget, NewComment};
use crate::model::profile::ProfileId;
use crate::model::story::{NewStory, Story, StoryId};
use crate::model::views::StoryView;
use crate::repo::comment_repo::CommentRepository;
use crate::repo::like_repo::LikeRepository;
use crate::repo::profile_repo::ProfileRepository;
use crate::repo::story_repo::StoryRepository;
use crate::service::post_service::LikeToggle;
use crate::service::{MediaRejection, ServiceError, ServiceResult};
use crate::storage::{BlobStore, MediaUpload, MEDIA_BUCKET};
use log::{info, warn};

pub struct StoryService<R, B> {
    repo: R,
    blobs: B,
    bucket: String,
}

impl<R, B> StoryService<R, B>
where
    R: StoryRepository + ProfileRepository + LikeRepository + CommentRepository,
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

    /// Uploads `media` and publishes a story expiring 24h after `now_ms`.
    pub fn create_story(
        &self,
        viewer: ProfileId,
        media: &MediaUpload,
        caption: Option<&str>,
        now_ms: i64,
    ) -> ServiceResult<Story> {
        if media.bytes.is_empty() {
            return Err(ServiceError::InvalidMedia(MediaRejection::Empty));
        }
        let path = media.timestamped_path(viewer, now_ms);
        self.blobs
            .upload(&self.bucket, &path, &media.bytes, &media.content_type, false)?;

        let media_type = if media.is_video() { "video" } else { "image" };
        let new_story = NewStory::expiring(
            viewer,
            self.blobs.public_url(&self.bucket, &path),
            Some(media_type.to_string()),
            caption
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string),
            now_ms,
        );
        let story = match self.repo.create_story(&new_story) {
            Ok(story) => story,
            Err(err) => {
                if let Err(cleanup) = self.blobs.remove(&self.bucket, &path) {
                    warn!(
                        "event=story_create module=service status=cleanup_failed error={cleanup}"
                    );
                }
                return Err(err.into());
            }
        };
        info!(
            "event=story_create module=service status=ok story_id={} expires_at={}",
            story.id, story.expires_at
        );
        Ok(story)
    }

    /// Unexpired stories with their authors, newest first.
    pub fn active_stories(&self, now_ms: i64) -> ServiceResult<Vec<StoryView>> {
        let stories = self.repo.list_active_stories(now_ms, None)?;
        let author_ids: Vec<ProfileId> = stories.iter().map(|story| story.user_id).collect();
        let authors = self.repo.author_summaries(&author_ids)?;
        Ok(stories
            .into_iter()
            .filter_map(|story| {
                let author = authors.get(&story.user_id)?.clone();
                Some(StoryView { story, author })
            })
            .collect())
    }

    pub fn view_story(&self, story_id: StoryId) -> ServiceResult<i64> {
        Ok(self.repo.increment_story_views(story_id)?)
    }

    pub fn like_story(&self, viewer: ProfileId, story_id: StoryId) -> ServiceResult<LikeToggle> {
        let target = EngagementTarget::Story(story_id);
        if self.repo.has_liked(viewer, target)? {
            let outcome = self.repo.unlike(viewer, target)?;
            return Ok(LikeToggle {
                liked: false,
                like_count: outcome.like_count,
            });
        }
        let outcome = self.repo.like(viewer, target)?;
        Ok(LikeToggle {
            liked: true,
            like_count: outcome.like_count,
        })
    }

    pub fn comment_story(
        &self,
        viewer: ProfileId,
        story_id: StoryId,
        text: &str,
    ) -> ServiceResult<Comment> {
        Ok(self.repo.add_comment(&NewComment {
            user_id: viewer,
            target: EngagementTarget::Story(story_id),
            content: text.to_string(),
        })?)
    }

    /// Deletes expired story rows; returns how many went away.
    pub fn purge_expired(&self, now_ms: i64) -> ServiceResult<usize> {
        let removed = self.repo.purge_expired_stories(now_ms)?;
        if removed > 0 {
            info!("event=story_purge module=service status=ok removed={removed}");
        }
        Ok(removed)
    }
}
