//! Plain-text rendering of screen data.

use chrono::{DateTime, Utc};
use social_core::model::views::{FeedItem, NotificationView, StoryView};
use social_core::model::{DAY_MS, HOUR_MS};
use std::path::Path;

const MINUTE_MS: i64 = 60 * 1000;

/// Renders `then_ms` relative to `now_ms`, e.g. `5 minutes ago`.
///
/// Anything older than 30 days falls back to the calendar date.
pub fn relative_time(then_ms: i64, now_ms: i64) -> String {
    let elapsed = now_ms.saturating_sub(then_ms);
    if elapsed < MINUTE_MS {
        return "just now".to_string();
    }
    let (count, unit) = if elapsed < HOUR_MS {
        (elapsed / MINUTE_MS, "minute")
    } else if elapsed < DAY_MS {
        (elapsed / HOUR_MS, "hour")
    } else if elapsed < 30 * DAY_MS {
        (elapsed / DAY_MS, "day")
    } else {
        return DateTime::<Utc>::from_timestamp_millis(then_ms)
            .map(|at| at.format("%b %-d, %Y").to_string())
            .unwrap_or_else(|| "long ago".to_string());
    };
    let plural = if count == 1 { "" } else { "s" };
    format!("{count} {unit}{plural} ago")
}

/// Compact counter, e.g. `1.2K`.
pub fn compact_count(value: i64) -> String {
    match value {
        v if v >= 1_000_000 => format!("{:.1}M", v as f64 / 1_000_000.0),
        v if v >= 1_000 => format!("{:.1}K", v as f64 / 1_000.0),
        v => v.to_string(),
    }
}

pub fn feed_item(item: &FeedItem, now_ms: i64) -> String {
    let post = &item.post;
    let mut lines = vec![format!(
        "@{} · {}{}",
        item.author.username,
        relative_time(post.created_at, now_ms),
        if post.is_boost_active(now_ms) { " · boosted" } else { "" }
    )];
    if let Some(content) = post.content.as_deref() {
        lines.push(format!("  {content}"));
    }
    if let Some(url) = post.media_url.as_deref() {
        let kind = post.media_type.map(|kind| kind.as_str()).unwrap_or("media");
        lines.push(format!("  [{kind}] {url}"));
    }
    if let Some(tags) = post.hashtags.as_ref() {
        let tags: Vec<String> = tags.iter().map(|tag| format!("#{tag}")).collect();
        lines.push(format!("  {}", tags.join(" ")));
    }
    lines.push(format!(
        "  {} {} likes · {} comments · {} views · id {}",
        if item.liked_by_viewer { "♥" } else { "♡" },
        compact_count(post.like_count),
        compact_count(post.comment_count),
        compact_count(post.view_count),
        post.id
    ));
    lines.join("\n")
}

pub fn story(view: &StoryView, now_ms: i64) -> String {
    let story = &view.story;
    let remaining_hours = (story.expires_at - now_ms).max(0) / HOUR_MS;
    format!(
        "@{} · {} · {}h left · {} views\n  {}{}\n  id {}",
        view.author.username,
        relative_time(story.created_at, now_ms),
        remaining_hours,
        story.view_count,
        story.media_url,
        story
            .content
            .as_deref()
            .map(|caption| format!(" · {caption}"))
            .unwrap_or_default(),
        story.id
    )
}

pub fn notification(view: &NotificationView, now_ms: i64) -> String {
    let notification = &view.notification;
    format!(
        "{} {} · {} · id {}",
        if notification.is_read { " " } else { "•" },
        notification.content,
        relative_time(notification.created_at, now_ms),
        notification.id
    )
}

/// MIME type inferred from a file extension.
pub fn guess_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}

/// Result line of a like toggle, e.g. `Unliked · 3 likes`.
pub fn like_status(liked: bool, like_count: i64) -> String {
    let state = if liked { "Liked" } else { "Unliked" };
    format!("{state} · {like_count} likes")
}

#[cfg(test)]
mod tests {
    use super::{
        compact_count, guess_content_type, like_status, relative_time, DAY_MS, HOUR_MS, MINUTE_MS,
    };
    use std::path::Path;

    #[test]
    fn relative_time_picks_largest_unit() {
        let now = 100 * DAY_MS;
        assert_eq!(relative_time(now - 10_000, now), "just now");
        assert_eq!(relative_time(now - 5 * MINUTE_MS, now), "5 minutes ago");
        assert_eq!(relative_time(now - HOUR_MS, now), "1 hour ago");
        assert_eq!(relative_time(now - 3 * DAY_MS, now), "3 days ago");
        assert_eq!(relative_time(now + MINUTE_MS, now), "just now");
    }

    #[test]
    fn old_timestamps_render_as_dates() {
        assert_eq!(relative_time(0, 40 * DAY_MS), "Jan 1, 1970");
    }

    #[test]
    fn counters_are_compacted() {
        assert_eq!(compact_count(999), "999");
        assert_eq!(compact_count(1_240), "1.2K");
        assert_eq!(compact_count(3_400_000), "3.4M");
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(guess_content_type(Path::new("a/B.PNG")), "image/png");
        assert_eq!(guess_content_type(Path::new("clip.mp4")), "video/mp4");
        assert_eq!(guess_content_type(Path::new("notes")), "application/octet-stream");
    }

    #[test]
    fn like_status_reflects_toggle_direction() {
        assert_eq!(like_status(true, 1), "Liked · 1 likes");
        assert_eq!(like_status(false, 0), "Unliked · 0 likes");
    }
}
