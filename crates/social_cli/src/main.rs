//! Command-line presentation layer over `social_core`.
//!
//! # Responsibility
//! - Map each screen action to one subcommand.
//! - Persist the signed-in session token under the data directory.
//! - Render failures as the same short toasts the screens show.

mod render;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::debug;
use social_core::config::ClientConfig;
use social_core::model::enums::{MediaType, ThemeType};
use social_core::model::message::Message;
use social_core::model::profile::{Profile, ProfileId, ProfileUpdate};
use social_core::model::views::FeedItem;
use social_core::model::HOUR_MS;
use social_core::service::analytics_service::{AnalyticsService, MAX_ACTIVITY_MONTHS};
use social_core::service::banner_service::BannerService;
use social_core::service::feed_service::{FeedService, ReelQueue};
use social_core::service::message_service::{MessageService, MessagesPane};
use social_core::service::notification_service::{NotificationInbox, NotificationService};
use social_core::service::post_service::{PostDraft, PostService, BOOST_COST_COINS};
use social_core::service::profile_service::{ProfileRef, ProfileService};
use social_core::service::settings_service::{SettingsService, VIP_COST_COINS};
use social_core::service::story_service::StoryService;
use social_core::service::tip_service::TipService;
use social_core::{
    init_logging, now_epoch_ms, open_db, AuthError, AuthService, FsBlobStore, LogTarget,
    MediaUpload, ServiceError, SqliteStore, Toast,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "social", version, about = "Terminal client for the social network")]
struct Cli {
    /// TOML config file.
    #[arg(long, global = true, env = "SOCIAL_CONFIG")]
    config: Option<PathBuf>,
    /// Overrides `data_dir`.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Overrides `log_level`.
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an account and sign in.
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        full_name: Option<String>,
    },
    Signin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Signout,
    Whoami,
    /// Home feed; boosted posts first.
    Feed {
        /// Only posts by followed profiles.
        #[arg(long)]
        following: bool,
    },
    /// Popular posts, or a search over content and hashtags.
    Explore { query: Option<String> },
    /// Top hashtags of the last week.
    Trending,
    Reels {
        /// Zero-based reel to open.
        #[arg(long, default_value_t = 0)]
        start: usize,
    },
    Post {
        #[arg(long, default_value = "")]
        content: String,
        /// e.g. "#rust #food".
        #[arg(long, default_value = "")]
        hashtags: String,
        #[arg(long)]
        media: Option<PathBuf>,
        #[arg(long, value_parser = parse_media_type, default_value = "image")]
        media_type: MediaType,
    },
    /// Toggle a like on a post.
    Like { post: Uuid },
    /// Comment on a post, or list its comments when no text is given.
    Comment { post: Uuid, text: Option<String> },
    /// Spend coins to pin a post to the top of feeds for 24 hours.
    Boost { post: Uuid },
    Delete { post: Uuid },
    Story {
        media: PathBuf,
        #[arg(long)]
        caption: Option<String>,
    },
    Stories {
        /// Record a view of this story.
        #[arg(long)]
        view: Option<Uuid>,
        #[arg(long)]
        like: Option<Uuid>,
    },
    Follow { profile: String },
    Unfollow { profile: String },
    /// Show a profile by `@username` or id; defaults to your own.
    Profile { profile: Option<String> },
    /// Conversation list.
    Inbox,
    Thread { profile: String },
    Send { profile: String, text: String },
    Notifications,
    /// Mark one notification, or all of them, as read.
    Read {
        #[arg(required_unless_present = "all")]
        id: Option<Uuid>,
        #[arg(long, conflicts_with = "id")]
        all: bool,
    },
    Tip {
        profile: String,
        amount: i64,
        #[arg(long)]
        post: Option<Uuid>,
        #[arg(long)]
        message: Option<String>,
    },
    Vip,
    Theme {
        #[arg(value_parser = parse_theme)]
        theme: ThemeType,
    },
    /// Edit profile fields.
    Edit {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        bio: Option<String>,
    },
    Avatar { image: PathBuf },
    Analytics {
        #[arg(
            long,
            default_value_t = 6,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_ACTIVITY_MONTHS))
        )]
        months: u32,
    },
    Banners,
}

fn parse_media_type(value: &str) -> Result<MediaType, String> {
    MediaType::parse(value).ok_or_else(|| format!("expected image|video|reel, got `{value}`"))
}

fn parse_theme(value: &str) -> Result<ThemeType, String> {
    ThemeType::parse(value).ok_or_else(|| format!("expected default|neon|gold, got `{value}`"))
}

/// Converts screen errors into toast-worded CLI errors.
trait OrToast<T> {
    fn or_toast(self, fallback: &str) -> Result<T>;
}

impl<T, E: Into<ServiceError>> OrToast<T> for Result<T, E> {
    fn or_toast(self, fallback: &str) -> Result<T> {
        self.map_err(|err| {
            let err: ServiceError = err.into();
            debug!("event=cli_command module=cli status=error error={err}");
            anyhow!("{}", err.toast(fallback))
        })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = ClientConfig::load(cli.config.as_deref()).context("failed to load config")?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }
    config.validate()?;

    let target = config
        .log_dir
        .clone()
        .map(LogTarget::Directory)
        .unwrap_or(LogTarget::Stderr);
    init_logging(&config.log_level, target).map_err(|err| anyhow!("{err}"))?;

    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!(
            "failed to create data directory `{}`",
            config.data_dir.display()
        )
    })?;
    let conn = open_db(config.db_path()).context("failed to open database")?;
    let app = App {
        config: &config,
        store: SqliteStore::try_new(&conn)?,
        blobs: FsBlobStore::new(config.media_root(), config.public_base_url.as_str()),
        now_ms: now_epoch_ms(),
    };
    app.dispatch(cli.command)
}

struct App<'a> {
    config: &'a ClientConfig,
    store: SqliteStore<'a>,
    blobs: FsBlobStore,
    now_ms: i64,
}

impl<'a> App<'a> {
    fn dispatch(&self, command: Command) -> Result<()> {
        match command {
            Command::Signup {
                email,
                password,
                username,
                full_name,
            } => {
                let (profile, session) = self
                    .auth()
                    .sign_up(&email, &password, &username, full_name.as_deref())
                    .or_toast("Failed to create account")?;
                self.save_token(&session.token)?;
                println!("{}", Toast::success(format!("Welcome, @{}!", profile.username)));
            }
            Command::Signin { email, password } => {
                let session = self
                    .auth()
                    .sign_in(&email, &password)
                    .or_toast("Failed to sign in")?;
                self.save_token(&session.token)?;
                let profile = self.profile_service().resolve(&ProfileRef::Id(session.profile_id));
                let profile = profile.or_toast("Failed to load profile")?;
                println!("{}", Toast::success(format!("Signed in as @{}", profile.username)));
            }
            Command::Signout => {
                if let Some(token) = self.session_token()? {
                    self.auth().sign_out(&token).or_toast("Failed to sign out")?;
                }
                self.clear_token()?;
                println!("{}", Toast::success("Signed out"));
            }
            Command::Whoami => {
                let viewer = self.viewer()?;
                let profile = self
                    .profile_service()
                    .resolve(&ProfileRef::Id(viewer))
                    .or_toast("Failed to load profile")?;
                print_profile_header(&profile);
            }
            Command::Feed { following } => {
                let feed = self.feed_service();
                let items = if following {
                    feed.following_feed(self.viewer()?)
                } else {
                    feed.home_feed(self.optional_viewer(), self.now_ms)
                }
                .or_toast("Failed to load feed")?;
                self.print_feed(&items);
            }
            Command::Explore { query } => {
                let feed = self.feed_service();
                let viewer = self.optional_viewer();
                let items = match query.as_deref() {
                    Some(query) => feed.search(viewer, query),
                    None => feed.explore(viewer),
                }
                .or_toast("Failed to load posts")?;
                self.print_feed(&items);
            }
            Command::Trending => {
                let tags = self
                    .feed_service()
                    .trending_hashtags(self.now_ms)
                    .or_toast("Failed to load trending hashtags")?;
                if tags.is_empty() {
                    println!("No trending hashtags yet");
                }
                for (rank, tag) in tags.iter().enumerate() {
                    println!("{}. #{} · {} posts", rank + 1, tag.tag, tag.count);
                }
            }
            Command::Reels { start } => {
                let items = self
                    .feed_service()
                    .reels(self.optional_viewer())
                    .or_toast("Failed to load reels")?;
                let mut queue = ReelQueue::new(items);
                if !queue.select(start) {
                    println!("No reels to show");
                    return Ok(());
                }
                if let Some(reel) = queue.current() {
                    let views = self
                        .post_service()
                        .record_view(reel.post.id)
                        .or_toast("Failed to load reels")?;
                    println!("Reel {}/{} · {views} views", queue.position() + 1, queue.len());
                    println!("{}", render::feed_item(reel, self.now_ms));
                }
            }
            Command::Post {
                content,
                hashtags,
                media,
                media_type,
            } => {
                let viewer = self.viewer()?;
                let media = media.as_deref().map(read_upload).transpose()?;
                let post = self
                    .post_service()
                    .create_post(
                        viewer,
                        PostDraft {
                            content,
                            hashtags,
                            media_type,
                            media,
                        },
                        self.now_ms,
                    )
                    .or_toast("Failed to create post")?;
                println!("{}", Toast::success(format!("Post created · id {}", post.id)));
            }
            Command::Like { post } => {
                let toggle = self
                    .post_service()
                    .toggle_like(self.viewer()?, post)
                    .or_toast("Failed to update like")?;
                println!("{}", render::like_status(toggle.liked, toggle.like_count));
            }
            Command::Comment { post, text } => {
                let service = self.post_service();
                if let Some(text) = text {
                    service
                        .comment(self.viewer()?, post, &text)
                        .or_toast("Failed to add comment")?;
                    println!("{}", Toast::success("Comment added"));
                    return Ok(());
                }
                let comments = service.comments(post).or_toast("Failed to load comments")?;
                for comment in comments {
                    let author = self
                        .profile_service()
                        .resolve(&ProfileRef::Id(comment.user_id))
                        .map(|profile| format!("@{}", profile.username))
                        .unwrap_or_else(|_| "someone".to_string());
                    println!(
                        "{author} · {}\n  {}",
                        render::relative_time(comment.created_at, self.now_ms),
                        comment.content
                    );
                }
            }
            Command::Boost { post } => {
                let boosted = self
                    .post_service()
                    .boost_post(self.viewer()?, post, self.now_ms)
                    .or_toast("Failed to boost post")?;
                let until = boosted.boost_expires_at.unwrap_or(self.now_ms);
                println!(
                    "{}",
                    Toast::success(format!(
                        "Boosted for {BOOST_COST_COINS} coins · {}h left",
                        (until - self.now_ms).max(0) / HOUR_MS
                    ))
                );
            }
            Command::Delete { post } => {
                self.post_service()
                    .delete_post(self.viewer()?, post)
                    .or_toast("Failed to delete post")?;
                println!("{}", Toast::success("Post deleted"));
            }
            Command::Story { media, caption } => {
                let viewer = self.viewer()?;
                let upload = read_upload(&media)?;
                let story = self
                    .story_service()
                    .create_story(viewer, &upload, caption.as_deref(), self.now_ms)
                    .or_toast("Failed to create story")?;
                println!("{}", Toast::success(format!("Story posted · id {}", story.id)));
            }
            Command::Stories { view, like } => {
                let service = self.story_service();
                if let Some(story) = view {
                    let views = service.view_story(story).or_toast("Failed to load story")?;
                    println!("{views} views");
                }
                if let Some(story) = like {
                    let toggle = service
                        .like_story(self.viewer()?, story)
                        .or_toast("Failed to like story")?;
                    println!("{}", render::like_status(toggle.liked, toggle.like_count));
                }
                service
                    .purge_expired(self.now_ms)
                    .or_toast("Failed to load stories")?;
                let stories = service
                    .active_stories(self.now_ms)
                    .or_toast("Failed to load stories")?;
                if stories.is_empty() {
                    println!("No active stories");
                }
                for story in &stories {
                    println!("{}", render::story(story, self.now_ms));
                }
            }
            Command::Follow { profile } => {
                let viewer = self.viewer()?;
                let target = self.resolve(&profile)?;
                let outcome = self
                    .profile_service()
                    .follow(viewer, target.id)
                    .or_toast("Failed to follow")?;
                println!(
                    "Following @{} · {} followers",
                    target.username, outcome.follower_count
                );
            }
            Command::Unfollow { profile } => {
                let viewer = self.viewer()?;
                let target = self.resolve(&profile)?;
                let outcome = self
                    .profile_service()
                    .unfollow(viewer, target.id)
                    .or_toast("Failed to unfollow")?;
                println!(
                    "Unfollowed @{} · {} followers",
                    target.username, outcome.follower_count
                );
            }
            Command::Profile { profile } => {
                let viewer = self.optional_viewer();
                let target = match (profile.as_deref(), viewer) {
                    (Some(value), _) => ProfileRef::parse(value),
                    (None, Some(viewer)) => ProfileRef::Id(viewer),
                    (None, None) => signed_out()?,
                };
                let page = self
                    .profile_service()
                    .profile_page(viewer, &target)
                    .or_toast("Failed to load profile")?;
                print_profile_header(&page.profile);
                if !page.badges.is_empty() {
                    let badges: Vec<&str> = page
                        .badges
                        .iter()
                        .map(|badge| badge.badge_type.as_str())
                        .collect();
                    println!("Badges: {}", badges.join(", "));
                }
                if !page.is_own {
                    let state = if page.is_following { "Following" } else { "Not following" };
                    println!("{state}");
                }
                println!();
                self.print_feed(&page.posts);
            }
            Command::Inbox => {
                let viewer = self.viewer()?;
                let conversations = self
                    .message_service()
                    .conversations(viewer)
                    .or_toast("Failed to load conversations")?;
                if conversations.is_empty() {
                    println!("No conversations yet");
                }
                for conversation in conversations {
                    println!(
                        "@{} · {}{}\n  {}",
                        conversation.other.username,
                        render::relative_time(conversation.last_message.created_at, self.now_ms),
                        match conversation.unread_count {
                            0 => String::new(),
                            unread => format!(" · {unread} unread"),
                        },
                        conversation.last_message.content
                    );
                }
            }
            Command::Thread { profile } => {
                let viewer = self.viewer()?;
                let other = self.resolve(&profile)?;
                let mut pane = self.messages_pane(viewer)?;
                let thread = pane.select(other.id).or_toast("Failed to load messages")?;
                self.print_thread(viewer, &other, thread);
            }
            Command::Send { profile, text } => {
                let viewer = self.viewer()?;
                let other = self.resolve(&profile)?;
                let mut pane = self.messages_pane(viewer)?;
                pane.select(other.id).or_toast("Failed to load messages")?;
                pane.send(&text).or_toast("Failed to send message")?;
                self.print_thread(viewer, &other, pane.thread());
            }
            Command::Notifications => {
                let viewer = self.viewer()?;
                let service = self.notification_service();
                let items = service.list(viewer).or_toast("Failed to load notifications")?;
                let unread = service
                    .unread_count(viewer)
                    .or_toast("Failed to load notifications")?;
                println!("{unread} unread");
                for item in &items {
                    println!("{}", render::notification(item, self.now_ms));
                }
            }
            Command::Read { id, all } => {
                let viewer = self.viewer()?;
                let mut inbox =
                    NotificationInbox::open(self.notification_service(), self.store.feed(), viewer)
                        .or_toast("Failed to load notifications")?;
                match id {
                    Some(id) if !all => {
                        inbox
                            .mark_read(id)
                            .or_toast("Failed to mark notification as read")?;
                    }
                    _ => {
                        inbox
                            .mark_all_read()
                            .or_toast("Failed to mark notifications as read")?;
                    }
                }
                println!("{} unread", inbox.unread());
            }
            Command::Tip {
                profile,
                amount,
                post,
                message,
            } => {
                let viewer = self.viewer()?;
                let receiver = self.resolve(&profile)?;
                let tip = self
                    .tip_service()
                    .send_tip(viewer, receiver.id, amount, post, message.as_deref())
                    .or_toast("Failed to send tip")?;
                println!(
                    "{}",
                    Toast::success(format!("Sent {} coins to @{}", tip.amount, receiver.username))
                );
            }
            Command::Vip => {
                let profile = self
                    .settings_service()
                    .upgrade_to_vip(self.viewer()?)
                    .or_toast("Failed to upgrade to VIP")?;
                println!(
                    "{}",
                    Toast::success(format!(
                        "Welcome to VIP! {VIP_COST_COINS} coins spent, {} left",
                        profile.coins
                    ))
                );
            }
            Command::Theme { theme } => {
                self.settings_service()
                    .change_theme(self.viewer()?, theme)
                    .or_toast("Failed to update theme")?;
                println!("{}", Toast::success(format!("Theme set to {theme}")));
            }
            Command::Edit {
                username,
                full_name,
                bio,
            } => {
                let update = ProfileUpdate {
                    username,
                    full_name: full_name.map(optional_text),
                    bio: bio.map(optional_text),
                    ..ProfileUpdate::default()
                };
                let profile = self
                    .settings_service()
                    .update_profile(self.viewer()?, &update)
                    .or_toast("Failed to update profile")?;
                println!("{}", Toast::success("Profile updated"));
                print_profile_header(&profile);
            }
            Command::Avatar { image } => {
                let viewer = self.viewer()?;
                let upload = read_upload(&image)?;
                let profile = self
                    .settings_service()
                    .change_avatar(viewer, &upload)
                    .or_toast("Failed to upload avatar")?;
                println!(
                    "{}",
                    Toast::success(format!(
                        "Avatar updated · {}",
                        profile.avatar_url.unwrap_or_default()
                    ))
                );
            }
            Command::Analytics { months } => {
                let viewer = self.viewer()?;
                let service = self.analytics_service();
                let summary = service.summary(viewer).or_toast("Failed to load analytics")?;
                let monthly = service
                    .monthly_activity(viewer, months, self.now_ms)
                    .or_toast("Failed to load analytics")?;
                println!(
                    "Posts {} · Likes {} · Comments {} · Views {}",
                    summary.total_posts,
                    render::compact_count(summary.total_likes),
                    render::compact_count(summary.total_comments),
                    render::compact_count(summary.total_views)
                );
                println!(
                    "Followers {} · Earnings {} coins",
                    summary.follower_count, summary.total_earnings
                );
                println!(
                    "Engagement {:.1}% · {:.1} likes per post",
                    summary.engagement_rate, summary.average_likes_per_post
                );
                println!(
                    "Share: likes {:.1}% · comments {:.1}% · views {:.1}%",
                    summary.distribution.likes,
                    summary.distribution.comments,
                    summary.distribution.views
                );
                if let Some(top) = summary.top_post.as_ref() {
                    println!("Top post {} · {} likes", top.id, top.like_count);
                }
                for month in monthly {
                    println!(
                        "{} {} · {} posts · {} likes · {} comments",
                        month.label, month.year, month.posts, month.likes, month.comments
                    );
                }
            }
            Command::Banners => {
                let banners = BannerService::new(self.store.clone())
                    .active_banners()
                    .or_toast("Failed to load banners")?;
                for banner in banners {
                    println!(
                        "{} · {}{}",
                        banner.title,
                        banner.image_url,
                        banner
                            .link_url
                            .map(|link| format!(" → {link}"))
                            .unwrap_or_default()
                    );
                }
            }
        }
        Ok(())
    }

    fn auth(&self) -> AuthService<SqliteStore<'a>> {
        AuthService::with_session_ttl_hours(self.store.clone(), self.config.session_ttl_hours)
    }

    fn feed_service(&self) -> FeedService<SqliteStore<'a>> {
        FeedService::with_limit(self.store.clone(), self.config.feed_limit)
    }

    fn post_service(&self) -> PostService<SqliteStore<'a>, FsBlobStore> {
        PostService::with_bucket(
            self.store.clone(),
            self.blobs.clone(),
            self.config.media_bucket.as_str(),
        )
    }

    fn story_service(&self) -> StoryService<SqliteStore<'a>, FsBlobStore> {
        StoryService::with_bucket(
            self.store.clone(),
            self.blobs.clone(),
            self.config.media_bucket.as_str(),
        )
    }

    fn settings_service(&self) -> SettingsService<SqliteStore<'a>, FsBlobStore> {
        SettingsService::with_bucket(
            self.store.clone(),
            self.blobs.clone(),
            self.config.media_bucket.as_str(),
        )
    }

    fn profile_service(&self) -> ProfileService<SqliteStore<'a>> {
        ProfileService::new(self.store.clone())
    }

    fn message_service(&self) -> MessageService<SqliteStore<'a>> {
        MessageService::new(self.store.clone())
    }

    fn messages_pane(&self, viewer: ProfileId) -> Result<MessagesPane<SqliteStore<'a>>> {
        MessagesPane::open(self.message_service(), self.store.feed(), viewer)
            .or_toast("Failed to load conversations")
    }

    fn notification_service(&self) -> NotificationService<SqliteStore<'a>> {
        NotificationService::new(self.store.clone())
    }

    fn tip_service(&self) -> TipService<SqliteStore<'a>> {
        TipService::new(self.store.clone())
    }

    fn analytics_service(&self) -> AnalyticsService<SqliteStore<'a>> {
        AnalyticsService::new(self.store.clone())
    }

    fn session_token(&self) -> Result<Option<String>> {
        let path = self.config.session_file();
        match std::fs::read_to_string(&path) {
            Ok(token) => Ok(Some(token.trim().to_string()).filter(|token| !token.is_empty())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => {
                Err(err).with_context(|| format!("failed to read `{}`", path.display()))
            }
        }
    }

    fn save_token(&self, token: &str) -> Result<()> {
        let path = self.config.session_file();
        std::fs::write(&path, token)
            .with_context(|| format!("failed to write `{}`", path.display()))
    }

    fn clear_token(&self) -> Result<()> {
        let path = self.config.session_file();
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("failed to remove `{}`", path.display()))
            }
        }
    }

    /// Signed-in profile; expired tokens are forgotten.
    fn viewer(&self) -> Result<ProfileId> {
        let Some(token) = self.session_token()? else {
            return signed_out();
        };
        match self.auth().current_session(&token, self.now_ms) {
            Ok(session) => Ok(session.profile_id),
            Err(AuthError::SessionExpired) => {
                self.clear_token()?;
                signed_out()
            }
            Err(err) => Err(err).or_toast("Failed to restore session"),
        }
    }

    fn optional_viewer(&self) -> Option<ProfileId> {
        self.viewer().ok()
    }

    fn resolve(&self, value: &str) -> Result<Profile> {
        self.profile_service()
            .resolve(&ProfileRef::parse(value))
            .or_toast("Failed to load profile")
    }

    fn print_feed(&self, items: &[FeedItem]) {
        if items.is_empty() {
            println!("No posts yet");
        }
        for item in items {
            println!("{}\n", render::feed_item(item, self.now_ms));
        }
    }

    fn print_thread(
        &self,
        viewer: ProfileId,
        other: &Profile,
        thread: &[Message],
    ) {
        println!("Conversation with @{}", other.username);
        for message in thread {
            let who = if message.sender_id == viewer {
                "you".to_string()
            } else {
                format!("@{}", other.username)
            };
            println!(
                "{who} · {} · {}\n  {}",
                render::relative_time(message.created_at, self.now_ms),
                message.status,
                message.content
            );
        }
    }
}

fn signed_out<T>() -> Result<T> {
    Err(ServiceError::Unauthenticated).or_toast("Please sign in first")
}

fn print_profile_header(profile: &Profile) {
    println!(
        "@{}{}{}",
        profile.username,
        profile
            .full_name
            .as_deref()
            .map(|name| format!(" ({name})"))
            .unwrap_or_default(),
        if profile.is_vip { " · VIP" } else { "" }
    );
    if let Some(bio) = profile.bio.as_deref() {
        println!("{bio}");
    }
    println!(
        "{} followers · {} following · {} coins · theme {}",
        profile.follower_count, profile.following_count, profile.coins, profile.theme
    );
}

/// Empty input clears the field.
fn optional_text(value: String) -> Option<String> {
    Some(value.trim().to_string()).filter(|value| !value.is_empty())
}

fn read_upload(path: &Path) -> Result<MediaUpload> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read `{}`", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string();
    Ok(MediaUpload::new(
        file_name,
        render::guess_content_type(path),
        bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn analytics_months_are_bounded() {
        let parsed = Cli::try_parse_from(["social", "analytics", "--months", "12"]).unwrap();
        assert!(matches!(parsed.command, Command::Analytics { months: 12 }));
        assert!(Cli::try_parse_from(["social", "analytics", "--months", "0"]).is_err());
        assert!(Cli::try_parse_from(["social", "analytics", "--months", "4294967295"]).is_err());
    }
}
