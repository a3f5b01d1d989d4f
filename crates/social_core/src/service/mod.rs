//! Screen-level use-case services.
//!
//! # Responsibility
//! - Turn repository calls into the operations each screen performs.
//! - Generate activity notifications for likes, comments, follows,
//!   messages and tips.
//! - Keep presentation layers decoupled from SQL and file storage.
//!
//! # Invariants
//! - Services never bypass repository validation or transactions.
//! - Every failure maps to a [`Toast`] through [`ServiceError::toast`].

pub mod analytics_service;
pub mod banner_service;
pub mod feed_service;
pub mod message_service;
pub mod notification_service;
pub mod post_service;
pub mod profile_service;
pub mod settings_service;
pub mod story_service;
pub mod tip_service;

use crate::auth::AuthError;
use crate::model::enums::NotificationType;
use crate::model::notification::NewNotification;
use crate::model::post::{Post, PostId};
use crate::model::profile::ProfileId;
use crate::model::views::FeedItem;
use crate::repo::like_repo::LikeRepository;
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::profile_repo::ProfileRepository;
use crate::repo::RepoError;
use crate::storage::BlobError;
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Why an upload was refused before reaching storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaRejection {
    NotAnImage,
    TooLarge { max_bytes: usize },
    Empty,
}

#[derive(Debug)]
pub enum ServiceError {
    Unauthenticated,
    NotFound { entity: &'static str, id: Uuid },
    UnknownUsername(String),
    /// Viewer may not act on this record.
    Forbidden(&'static str),
    InsufficientCoins { required: i64, available: i64 },
    InvalidInput(String),
    InvalidMedia(MediaRejection),
    AlreadyVip,
    Storage(BlobError),
    Auth(AuthError),
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "not signed in"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::UnknownUsername(username) => write!(f, "no profile named `{username}`"),
            Self::Forbidden(action) => write!(f, "not allowed to {action}"),
            Self::InsufficientCoins {
                required,
                available,
            } => write!(
                f,
                "insufficient coins: {required} required, {available} available"
            ),
            Self::InvalidInput(message) => write!(f, "{message}"),
            Self::InvalidMedia(MediaRejection::NotAnImage) => write!(f, "file is not an image"),
            Self::InvalidMedia(MediaRejection::TooLarge { max_bytes }) => {
                write!(f, "file exceeds {max_bytes} bytes")
            }
            Self::InvalidMedia(MediaRejection::Empty) => write!(f, "file is empty"),
            Self::AlreadyVip => write!(f, "profile is already VIP"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Auth(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Auth(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::InsufficientCoins {
                required,
                available,
            } => Self::InsufficientCoins {
                required,
                available,
            },
            RepoError::Validation(err) => Self::InvalidInput(err.to_string()),
            other => Self::Repo(other),
        }
    }
}

impl From<BlobError> for ServiceError {
    fn from(value: BlobError) -> Self {
        Self::Storage(value)
    }
}

impl From<AuthError> for ServiceError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::SessionExpired => Self::Unauthenticated,
            AuthError::Repo(err) => err.into(),
            other => Self::Auth(other),
        }
    }
}

/// Short title/description pair shown for an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
}

impl Toast {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn success(description: impl Into<String>) -> Self {
        Self::new("Success", description)
    }
}

impl Display for Toast {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

impl ServiceError {
    /// User-facing toast; `fallback` describes the failed screen action,
    /// e.g. `"Failed to load feed"`.
    pub fn toast(&self, fallback: &str) -> Toast {
        match self {
            Self::Unauthenticated => Toast::new("Error", "Please sign in first"),
            Self::InsufficientCoins { required, .. } => {
                Toast::new("Insufficient coins", format!("You need {required} coins"))
            }
            Self::InvalidMedia(MediaRejection::NotAnImage) => {
                Toast::new("Invalid file type", "Please select an image file")
            }
            Self::InvalidMedia(MediaRejection::TooLarge { max_bytes }) => Toast::new(
                "File too large",
                format!(
                    "Please select an image smaller than {}MB",
                    max_bytes / (1024 * 1024)
                ),
            ),
            Self::InvalidInput(message) => Toast::new("Error", message.clone()),
            Self::Auth(err) => Toast::new("Error", err.to_string()),
            Self::AlreadyVip => Toast::new("Error", "You are already a VIP member"),
            Self::UnknownUsername(username) => {
                Toast::new("Error", format!("No profile named @{username}"))
            }
            _ => Toast::new("Error", fallback),
        }
    }
}

/// Joins posts with their author and the viewer's like state.
///
/// Posts whose author row is gone are skipped.
pub(crate) fn hydrate_posts<R>(
    repo: &R,
    viewer: Option<ProfileId>,
    posts: Vec<Post>,
) -> ServiceResult<Vec<FeedItem>>
where
    R: ProfileRepository + LikeRepository,
{
    let author_ids: Vec<ProfileId> = posts.iter().map(|post| post.user_id).collect();
    let authors = repo.author_summaries(&author_ids)?;
    let liked = match viewer {
        Some(viewer) => {
            let post_ids: Vec<PostId> = posts.iter().map(|post| post.id).collect();
            repo.liked_post_ids(viewer, &post_ids)?
        }
        None => Default::default(),
    };

    Ok(posts
        .into_iter()
        .filter_map(|post| {
            let author = authors.get(&post.user_id)?.clone();
            let liked_by_viewer = liked.contains(&post.id);
            Some(FeedItem {
                post,
                author,
                liked_by_viewer,
            })
        })
        .collect())
}

/// Records an activity notification for `recipient` unless the actor is
/// the recipient.
///
/// Notification failures are logged and swallowed; the triggering action
/// has already been committed.
pub(crate) fn notify_activity<R>(
    repo: &R,
    recipient: ProfileId,
    actor: ProfileId,
    kind: NotificationType,
    post_id: Option<PostId>,
) where
    R: ProfileRepository + NotificationRepository,
{
    if recipient == actor {
        return;
    }
    let result = repo.get_profile(actor).and_then(|profile| {
        let username = profile
            .map(|profile| profile.username)
            .unwrap_or_else(|| "someone".to_string());
        let notification =
            NewNotification::activity(recipient, actor, kind, &username, post_id);
        repo.create_notification(&notification)
    });
    if let Err(err) = result {
        warn!(
            "event=notification_create module=service status=error kind={} recipient={} error={}",
            kind.as_str(),
            recipient,
            err
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{MediaRejection, ServiceError, Toast};
    use crate::auth::AuthError;
    use crate::repo::RepoError;
    use uuid::Uuid;

    #[test]
    fn repo_errors_map_to_screen_errors() {
        let id = Uuid::new_v4();
        assert!(matches!(
            ServiceError::from(RepoError::NotFound { entity: "post", id }),
            ServiceError::NotFound { entity: "post", .. }
        ));
        assert!(matches!(
            ServiceError::from(RepoError::InsufficientCoins {
                required: 50,
                available: 3
            }),
            ServiceError::InsufficientCoins { required: 50, available: 3 }
        ));
        assert!(matches!(
            ServiceError::from(AuthError::SessionExpired),
            ServiceError::Unauthenticated
        ));
    }

    #[test]
    fn toast_uses_fallback_for_infrastructure_failures() {
        let err = ServiceError::Repo(RepoError::InvalidData("bad row".to_string()));
        assert_eq!(
            err.toast("Failed to load feed"),
            Toast::new("Error", "Failed to load feed")
        );
        let err = ServiceError::InvalidMedia(MediaRejection::TooLarge {
            max_bytes: 5 * 1024 * 1024,
        });
        assert_eq!(
            err.toast("ignored").description,
            "Please select an image smaller than 5MB"
        );
    }
}
