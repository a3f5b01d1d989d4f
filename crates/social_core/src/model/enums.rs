//! Schema enums persisted as lowercase text.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Achievement badge kinds granted to profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeType {
    Bronze,
    Silver,
    Gold,
    /// Granted by the paid VIP upgrade.
    Vip,
}

impl BadgeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Vip => "vip",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "bronze" => Some(Self::Bronze),
            "silver" => Some(Self::Silver),
            "gold" => Some(Self::Gold),
            "vip" => Some(Self::Vip),
            _ => None,
        }
    }
}

/// Delivery state of a direct message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Sent,
    /// Receiver dismissed the sender's messages.
    Ignored,
}

impl MessageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Ignored => "ignored",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sent" => Some(Self::Sent),
            "ignored" => Some(Self::Ignored),
            _ => None,
        }
    }
}

/// Activity kinds that produce a notification row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Like,
    Comment,
    Follow,
    Message,
    Tip,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Comment => "comment",
            Self::Follow => "follow",
            Self::Message => "message",
            Self::Tip => "tip",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "like" => Some(Self::Like),
            "comment" => Some(Self::Comment),
            "follow" => Some(Self::Follow),
            "message" => Some(Self::Message),
            "tip" => Some(Self::Tip),
            _ => None,
        }
    }
}

/// Post media kind (`post_type` in the hosted schema).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    #[default]
    Image,
    Video,
    /// Short vertical video shown in the reels view.
    Reel,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Reel => "reel",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "reel" => Some(Self::Reel),
            _ => None,
        }
    }

    /// Whether players should render this media as video.
    pub fn is_video(self) -> bool {
        matches!(self, Self::Video | Self::Reel)
    }
}

/// Cosmetic profile theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeType {
    #[default]
    Default,
    Neon,
    Gold,
}

impl ThemeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Neon => "neon",
            Self::Gold => "gold",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "default" => Some(Self::Default),
            "neon" => Some(Self::Neon),
            "gold" => Some(Self::Gold),
            _ => None,
        }
    }
}

macro_rules! impl_display_as_str {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Display for $ty {
                fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )+
    };
}

impl_display_as_str!(BadgeType, MessageStatus, NotificationType, MediaType, ThemeType);

#[cfg(test)]
mod tests {
    use super::{BadgeType, MediaType, MessageStatus, NotificationType, ThemeType};

    #[test]
    fn parse_rejects_non_lowercase_values() {
        assert_eq!(BadgeType::parse("VIP"), None);
        assert_eq!(MediaType::parse("Reel"), None);
        assert_eq!(ThemeType::parse(" neon"), None);
    }

    #[test]
    fn serde_names_match_db_names() {
        let json = serde_json::to_string(&NotificationType::Tip).expect("serialize");
        assert_eq!(json, "\"tip\"");
        let status: MessageStatus = serde_json::from_str("\"ignored\"").expect("deserialize");
        assert_eq!(status, MessageStatus::Ignored);
    }

    #[test]
    fn reels_and_videos_play_as_video() {
        assert!(MediaType::Reel.is_video());
        assert!(MediaType::Video.is_video());
        assert!(!MediaType::Image.is_video());
    }
}
