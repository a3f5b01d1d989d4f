//! Home feed, explore, search and reels.
//!
//! # Invariants
//! - Lists are capped at the configured feed limit (default 20).
//! - The home feed puts posts with an open boost window first.
//! - Trending tags rank by count, ties by tag ascending.

use crate::model::enums::MediaType;
use crate::model::profile::ProfileId;
use crate::model::views::FeedItem;
use crate::model::DAY_MS;
use crate::repo::follow_repo::FollowRepository;
use crate::repo::like_repo::LikeRepository;
use crate::repo::post_repo::{PostListQuery, PostOrder, PostRepository, POSTS_DEFAULT_LIMIT};
use crate::repo::profile_repo::ProfileRepository;
use crate::service::{hydrate_posts, ServiceResult};
use log::debug;
use std::collections::HashMap;

pub const TRENDING_WINDOW_MS: i64 = 7 * DAY_MS;
pub const TRENDING_TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashtagCount {
    pub tag: String,
    pub count: usize,
}

/// Read-only post lists for the feed, explore and reels screens.
pub struct FeedService<R> {
    repo: R,
    limit: u32,
}

impl<R> FeedService<R>
where
    R: PostRepository + ProfileRepository + LikeRepository + FollowRepository,
{
    pub fn new(repo: R) -> Self {
        Self::with_limit(repo, POSTS_DEFAULT_LIMIT)
    }

    pub fn with_limit(repo: R, limit: u32) -> Self {
        Self { repo, limit }
    }

    /// Newest posts, boosted ones first.
    pub fn home_feed(&self, viewer: Option<ProfileId>, now_ms: i64) -> ServiceResult<Vec<FeedItem>> {
        self.load(
            viewer,
            PostListQuery {
                order: PostOrder::BoostedFirst { now_ms },
                ..self.base_query()
            },
        )
    }

    /// Newest posts by profiles the viewer follows, plus the viewer's own.
    pub fn following_feed(&self, viewer: ProfileId) -> ServiceResult<Vec<FeedItem>> {
        let mut authors = self.repo.following_ids(viewer)?;
        authors.push(viewer);
        self.load(
            Some(viewer),
            PostListQuery {
                authors: Some(authors),
                ..self.base_query()
            },
        )
    }

    /// Most-liked posts.
    pub fn explore(&self, viewer: Option<ProfileId>) -> ServiceResult<Vec<FeedItem>> {
        self.load(
            viewer,
            PostListQuery {
                order: PostOrder::MostLiked,
                ..self.base_query()
            },
        )
    }

    /// Content substring or exact hashtag match; blank input shows explore.
    pub fn search(&self, viewer: Option<ProfileId>, query: &str) -> ServiceResult<Vec<FeedItem>> {
        let query = query.trim().trim_start_matches('#').trim();
        if query.is_empty() {
            return self.explore(viewer);
        }
        self.load(
            viewer,
            PostListQuery {
                search: Some(query.to_string()),
                ..self.base_query()
            },
        )
    }

    /// Top hashtags of the last seven days.
    pub fn trending_hashtags(&self, now_ms: i64) -> ServiceResult<Vec<HashtagCount>> {
        let lists = self.repo.hashtags_since(now_ms - TRENDING_WINDOW_MS)?;
        Ok(rank_hashtags(lists, TRENDING_TOP_N))
    }

    /// Newest reel posts.
    pub fn reels(&self, viewer: Option<ProfileId>) -> ServiceResult<Vec<FeedItem>> {
        self.load(
            viewer,
            PostListQuery {
                media_type: Some(MediaType::Reel),
                ..self.base_query()
            },
        )
    }

    fn base_query(&self) -> PostListQuery {
        PostListQuery {
            limit: Some(self.limit),
            ..PostListQuery::default()
        }
    }

    fn load(&self, viewer: Option<ProfileId>, query: PostListQuery) -> ServiceResult<Vec<FeedItem>> {
        let posts = self.repo.list_posts(&query)?;
        let items = hydrate_posts(&self.repo, viewer, posts)?;
        debug!(
            "event=feed_load module=service status=ok order={:?} items={}",
            query.order,
            items.len()
        );
        Ok(items)
    }
}

/// Counts every tag across `lists` and keeps the `top_n` most frequent.
pub fn rank_hashtags(lists: Vec<Vec<String>>, top_n: usize) -> Vec<HashtagCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for tag in lists.into_iter().flatten() {
        *counts.entry(tag).or_default() += 1;
    }
    let mut ranked: Vec<HashtagCount> = counts
        .into_iter()
        .map(|(tag, count)| HashtagCount { tag, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    ranked.truncate(top_n);
    ranked
}

/// Playback position over a loaded reel list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReelQueue {
    items: Vec<FeedItem>,
    index: usize,
    playing: bool,
}

impl ReelQueue {
    /// Starts at the first reel, playing.
    pub fn new(items: Vec<FeedItem>) -> Self {
        Self {
            items,
            index: 0,
            playing: true,
        }
    }

    pub fn current(&self) -> Option<&FeedItem> {
        self.items.get(self.index)
    }

    pub fn position(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Advances unless already at the last reel; returns whether it moved.
    pub fn next(&mut self) -> bool {
        if self.index + 1 < self.items.len() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Steps back unless already at the first reel.
    pub fn previous(&mut self) -> bool {
        if self.index > 0 {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    /// Jumps to `index` when it is in range.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.index = index;
            true
        } else {
            false
        }
    }

    /// Flips play/pause and returns the new playing state.
    pub fn toggle_play(&mut self) -> bool {
        self.playing = !self.playing;
        self.playing
    }
}
