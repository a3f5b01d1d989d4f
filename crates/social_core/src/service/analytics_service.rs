//! Creator dashboard metrics.
//!
//! # Invariants
//! - Engagement rate is `(likes + comments) / views * 100`, and `0.0` when
//!   the creator has no views.
//! - Monthly buckets are UTC calendar months, oldest first, ending with the
//!   month containing `now_ms`.
//! - At most [`MAX_ACTIVITY_MONTHS`] buckets are produced.

use crate::model::post::Post;
use crate::model::profile::ProfileId;
use crate::repo::post_repo::{PostListQuery, PostRepository};
use crate::repo::profile_repo::ProfileRepository;
use crate::repo::tip_repo::TipRepository;
use crate::service::{ServiceError, ServiceResult};
use chrono::{DateTime, Datelike, TimeZone, Utc};

/// Ten years of monthly buckets.
pub const MAX_ACTIVITY_MONTHS: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngagementShare {
    pub likes: f64,
    pub comments: f64,
    pub views: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsSummary {
    pub total_posts: usize,
    pub total_likes: i64,
    pub total_comments: i64,
    pub total_views: i64,
    /// Coins received as tips.
    pub total_earnings: i64,
    pub follower_count: i64,
    pub engagement_rate: f64,
    pub average_likes_per_post: f64,
    /// Most-liked post; ties go to the newest.
    pub top_post: Option<Post>,
    /// Percent shares of likes, comments and views in their sum.
    pub distribution: EngagementShare,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyActivity {
    pub year: i32,
    pub month: u32,
    /// Short month name, e.g. `Jan`.
    pub label: String,
    pub posts: usize,
    pub likes: i64,
    pub comments: i64,
}

pub struct AnalyticsService<R> {
    repo: R,
}

impl<R> AnalyticsService<R>
where
    R: PostRepository + ProfileRepository + TipRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn summary(&self, viewer: ProfileId) -> ServiceResult<AnalyticsSummary> {
        let profile = self.repo.get_profile(viewer)?.ok_or(ServiceError::NotFound {
            entity: "profile",
            id: viewer,
        })?;
        let posts = self.repo.list_posts(&PostListQuery::by_author(viewer))?;
        let total_earnings = self.repo.sum_tips_received(viewer)?;
        Ok(summarize(posts, total_earnings, profile.follower_count))
    }

    /// Activity of the last `months` calendar months.
    pub fn monthly_activity(
        &self,
        viewer: ProfileId,
        months: u32,
        now_ms: i64,
    ) -> ServiceResult<Vec<MonthlyActivity>> {
        let posts = self.repo.list_posts(&PostListQuery::by_author(viewer))?;
        Ok(bucket_by_month(&posts, months, now_ms))
    }
}

/// Folds a creator's posts into dashboard totals.
pub fn summarize(posts: Vec<Post>, total_earnings: i64, follower_count: i64) -> AnalyticsSummary {
    let total_posts = posts.len();
    let total_likes: i64 = posts.iter().map(|post| post.like_count).sum();
    let total_comments: i64 = posts.iter().map(|post| post.comment_count).sum();
    let total_views: i64 = posts.iter().map(|post| post.view_count).sum();

    let engagement_rate = if total_views > 0 {
        (total_likes + total_comments) as f64 / total_views as f64 * 100.0
    } else {
        0.0
    };
    let average_likes_per_post = if total_posts > 0 {
        total_likes as f64 / total_posts as f64
    } else {
        0.0
    };
    let engagement_total = total_likes + total_comments + total_views;
    let share = |value: i64| {
        if engagement_total > 0 {
            value as f64 / engagement_total as f64 * 100.0
        } else {
            0.0
        }
    };
    let distribution = EngagementShare {
        likes: share(total_likes),
        comments: share(total_comments),
        views: share(total_views),
    };
    // `max_by_key` keeps the last maximum; walk oldest first so ties pick the newest.
    let top_post = posts
        .into_iter()
        .rev()
        .max_by_key(|post| post.like_count);

    AnalyticsSummary {
        total_posts,
        total_likes,
        total_comments,
        total_views,
        total_earnings,
        follower_count,
        engagement_rate,
        average_likes_per_post,
        top_post,
        distribution,
    }
}

/// Buckets posts into the `months` UTC months ending at `now_ms`.
///
/// `months` is clamped to [`MAX_ACTIVITY_MONTHS`].
pub fn bucket_by_month(posts: &[Post], months: u32, now_ms: i64) -> Vec<MonthlyActivity> {
    let months = months.min(MAX_ACTIVITY_MONTHS);
    let Some(now) = DateTime::<Utc>::from_timestamp_millis(now_ms) else {
        return Vec::new();
    };
    let mut buckets: Vec<MonthlyActivity> = (0..months)
        .rev()
        .map(|back| {
            let (year, month) = months_before(now.year(), now.month(), back);
            MonthlyActivity {
                year,
                month,
                label: month_label(month).to_string(),
                posts: 0,
                likes: 0,
                comments: 0,
            }
        })
        .collect();

    for post in posts {
        let Some(created) = Utc.timestamp_millis_opt(post.created_at).single() else {
            continue;
        };
        if let Some(bucket) = buckets
            .iter_mut()
            .find(|bucket| bucket.year == created.year() && bucket.month == created.month())
        {
            bucket.posts += 1;
            bucket.likes += post.like_count;
            bucket.comments += post.comment_count;
        }
    }
    buckets
}

fn months_before(year: i32, month: u32, back: u32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

fn month_label(month: u32) -> &'static str {
    match month {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        _ => "Dec",
    }
}

#[cfg(test)]
mod tests {
    use super::{bucket_by_month, months_before, summarize, MAX_ACTIVITY_MONTHS};
    use crate::model::post::Post;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn post(likes: i64, comments: i64, views: i64, created_at: i64) -> Post {
        Post {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            content: Some("post".to_string()),
            media_url: None,
            media_type: None,
            hashtags: None,
            like_count: likes,
            comment_count: comments,
            view_count: views,
            is_boosted: false,
            boost_expires_at: None,
            created_at,
        }
    }

    #[test]
    fn summary_without_views_has_zero_engagement() {
        let summary = summarize(vec![post(3, 1, 0, 1), post(1, 0, 0, 2)], 0, 7);
        assert_eq!(summary.total_likes, 4);
        assert_eq!(summary.engagement_rate, 0.0);
        assert_eq!(summary.average_likes_per_post, 2.0);
        assert_eq!(summary.follower_count, 7);
        assert_eq!(summary.top_post.unwrap().like_count, 3);
    }

    #[test]
    fn summary_computes_rate_and_distribution() {
        let summary = summarize(vec![post(10, 10, 80, 1)], 25, 0);
        assert_eq!(summary.engagement_rate, 25.0);
        assert!((summary.distribution.likes - 10.0).abs() < 1e-9);
        assert!((summary.distribution.views - 80.0).abs() < 1e-9);
        assert_eq!(summary.total_earnings, 25);

        let empty = summarize(Vec::new(), 0, 0);
        assert!(empty.top_post.is_none());
        assert_eq!(empty.distribution.likes, 0.0);
    }

    #[test]
    fn months_before_wraps_years() {
        assert_eq!(months_before(2024, 3, 0), (2024, 3));
        assert_eq!(months_before(2024, 3, 3), (2023, 12));
        assert_eq!(months_before(2024, 1, 13), (2022, 12));
    }

    #[test]
    fn bucket_by_month_counts_utc_months() {
        let ms = |y, m, d| {
            Utc.with_ymd_and_hms(y, m, d, 12, 0, 0)
                .unwrap()
                .timestamp_millis()
        };
        let posts = vec![
            post(5, 1, 0, ms(2024, 3, 2)),
            post(2, 2, 0, ms(2024, 3, 30)),
            post(1, 0, 0, ms(2024, 1, 15)),
            post(9, 9, 0, ms(2023, 6, 1)),
        ];
        let buckets = bucket_by_month(&posts, 3, ms(2024, 3, 31));
        let labels: Vec<&str> = buckets.iter().map(|bucket| bucket.label.as_str()).collect();
        assert_eq!(labels, vec!["Jan", "Feb", "Mar"]);
        assert_eq!(buckets[0].posts, 1);
        assert_eq!(buckets[1].posts, 0);
        assert_eq!(buckets[2].posts, 2);
        assert_eq!(buckets[2].likes, 7);
        assert_eq!(buckets[2].comments, 3);
    }

    #[test]
    fn bucket_by_month_caps_the_window() {
        let now = Utc
            .with_ymd_and_hms(2024, 3, 31, 12, 0, 0)
            .unwrap()
            .timestamp_millis();
        let buckets = bucket_by_month(&[], u32::MAX, now);
        assert_eq!(buckets.len(), MAX_ACTIVITY_MONTHS as usize);
        assert_eq!((buckets[0].year, buckets[0].month), (2014, 4));
        assert_eq!(buckets.last().map(|bucket| bucket.month), Some(3));
        assert!(bucket_by_month(&[], 0, now).is_empty());
    }
}
