use social_core::db::open_db_in_memory;
use social_core::model::enums::MediaType;
use social_core::model::profile::{NewProfile, Profile};
use social_core::model::DAY_MS;
use social_core::repo::post_repo::PostRepository;
use social_core::repo::profile_repo::ProfileRepository;
use social_core::repo::wallet_repo::WalletRepository;
use social_core::service::feed_service::{FeedService, ReelQueue};
use social_core::service::post_service::{PostDraft, PostService};
use social_core::storage::MEDIA_BUCKET;
use social_core::{BlobStore, FsBlobStore, MediaUpload, ServiceError, SqliteStore};
use uuid::Uuid;

const NOW: i64 = 1_700_000_000_000;

fn profile(store: &SqliteStore<'_>, username: &str) -> Profile {
    store
        .create_profile(&NewProfile {
            id: Uuid::new_v4(),
            username: username.to_string(),
            full_name: None,
        })
        .unwrap()
}

fn text_draft(content: &str, hashtags: &str) -> PostDraft {
    PostDraft {
        content: content.to_string(),
        hashtags: hashtags.to_string(),
        ..PostDraft::default()
    }
}

#[test]
fn create_post_uploads_media_and_parses_hashtags() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let blobs = FsBlobStore::new(dir.path(), "https://cdn.test/storage/");
    let mira = profile(&store, "mira");
    let posts = PostService::new(store.clone(), blobs.clone());

    let post = posts
        .create_post(
            mira.id,
            PostDraft {
                content: "  sunset  ".to_string(),
                hashtags: "#travel #food #travel".to_string(),
                media_type: MediaType::Image,
                media: Some(MediaUpload::new("beach.PNG", "image/png", vec![1, 2, 3])),
            },
            NOW,
        )
        .unwrap();

    assert_eq!(post.content.as_deref(), Some("sunset"));
    assert_eq!(
        post.hashtags,
        Some(vec!["travel".to_string(), "food".to_string()])
    );
    assert_eq!(post.media_type, Some(MediaType::Image));
    let path = format!("{}/{NOW}.png", mira.id);
    assert_eq!(
        post.media_url.as_deref(),
        Some(format!("https://cdn.test/storage/{MEDIA_BUCKET}/{path}").as_str())
    );
    assert_eq!(blobs.download(MEDIA_BUCKET, &path).unwrap(), vec![1, 2, 3]);
}

#[test]
fn text_only_post_has_no_media_type() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mira = profile(&store, "mira");
    let posts = PostService::new(store.clone(), FsBlobStore::new(dir.path(), "http://local"));

    let post = posts
        .create_post(
            mira.id,
            PostDraft {
                media_type: MediaType::Reel,
                ..text_draft("hello", "")
            },
            NOW,
        )
        .unwrap();
    assert_eq!(post.media_type, None);
    assert_eq!(post.hashtags, None);

    let empty = posts.create_post(mira.id, text_draft("   ", "#tag"), NOW);
    assert!(matches!(empty, Err(ServiceError::InvalidInput(_))));
}

#[test]
fn home_feed_puts_active_boosts_first() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mira = profile(&store, "mira");
    let posts = PostService::new(store.clone(), FsBlobStore::new(dir.path(), "http://local"));

    let old = posts.create_post(mira.id, text_draft("old", ""), NOW - 3_000).unwrap();
    let middle = posts.create_post(mira.id, text_draft("middle", ""), NOW - 2_000).unwrap();
    let new = posts.create_post(mira.id, text_draft("new", ""), NOW - 1_000).unwrap();

    store.credit_coins(mira.id, 60).unwrap();
    let boosted = posts.boost_post(mira.id, old.id, NOW).unwrap();
    assert!(boosted.is_boost_active(NOW));
    assert_eq!(boosted.boost_expires_at, Some(NOW + DAY_MS));
    assert_eq!(store.get_profile(mira.id).unwrap().unwrap().coins, 10);

    let feed = FeedService::new(store.clone());
    let order: Vec<Uuid> = feed
        .home_feed(Some(mira.id), NOW)
        .unwrap()
        .into_iter()
        .map(|item| item.post.id)
        .collect();
    assert_eq!(order, vec![old.id, new.id, middle.id]);

    let after_expiry: Vec<Uuid> = feed
        .home_feed(None, NOW + 2 * DAY_MS)
        .unwrap()
        .into_iter()
        .map(|item| item.post.id)
        .collect();
    assert_eq!(after_expiry, vec![new.id, middle.id, old.id]);

    let broke = posts.boost_post(mira.id, new.id, NOW);
    assert!(matches!(
        broke,
        Err(ServiceError::InsufficientCoins {
            required: 50,
            available: 10
        })
    ));
}

#[test]
fn boosting_an_active_boost_extends_it() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mira = profile(&store, "mira");
    let otto = profile(&store, "otto");
    let posts = PostService::new(store.clone(), FsBlobStore::new(dir.path(), "http://local"));
    let post = posts.create_post(mira.id, text_draft("boost me", ""), NOW).unwrap();
    store.credit_coins(mira.id, 100).unwrap();
    store.credit_coins(otto.id, 100).unwrap();

    posts.boost_post(mira.id, post.id, NOW).unwrap();
    let extended = posts.boost_post(mira.id, post.id, NOW + 1_000).unwrap();
    assert_eq!(extended.boost_expires_at, Some(NOW + 2 * DAY_MS));

    let foreign = posts.boost_post(otto.id, post.id, NOW);
    assert!(matches!(foreign, Err(ServiceError::Forbidden(_))));
    assert_eq!(store.get_profile(otto.id).unwrap().unwrap().coins, 100);
}

#[test]
fn boosting_after_expiry_starts_a_fresh_window() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mira = profile(&store, "mira");
    let posts = PostService::new(store.clone(), FsBlobStore::new(dir.path(), "http://local"));
    let post = posts.create_post(mira.id, text_draft("boost me again", ""), NOW).unwrap();
    store.credit_coins(mira.id, 100).unwrap();

    let first = posts.boost_post(mira.id, post.id, NOW).unwrap();
    assert_eq!(first.boost_expires_at, Some(NOW + DAY_MS));

    let later = NOW + 2 * DAY_MS;
    let renewed = posts.boost_post(mira.id, post.id, later).unwrap();
    assert!(renewed.is_boosted);
    assert_eq!(renewed.boost_expires_at, Some(later + DAY_MS));
    assert_eq!(store.get_profile(mira.id).unwrap().unwrap().coins, 0);
}

#[test]
fn explore_search_trending_and_reels() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mira = profile(&store, "mira");
    let otto = profile(&store, "otto");
    let posts = PostService::new(store.clone(), FsBlobStore::new(dir.path(), "http://local"));

    let ramen = posts
        .create_post(mira.id, text_draft("Best RAMEN in town", "#food #tokyo"), NOW - 1_000)
        .unwrap();
    let hike = posts
        .create_post(mira.id, text_draft("hike day", "#travel #food"), NOW - 500)
        .unwrap();
    posts
        .create_post(mira.id, text_draft("ancient", "#retro"), NOW - 10 * DAY_MS)
        .unwrap();
    let reel = posts
        .create_post(
            otto.id,
            PostDraft {
                media_type: MediaType::Reel,
                media: Some(MediaUpload::new("clip.mp4", "video/mp4", vec![9; 4])),
                ..text_draft("", "")
            },
            NOW,
        )
        .unwrap();
    posts.toggle_like(otto.id, ramen.id).unwrap();

    let feed = FeedService::new(store.clone());
    let explore = feed.explore(Some(otto.id)).unwrap();
    assert_eq!(explore[0].post.id, ramen.id);
    assert!(explore[0].liked_by_viewer);
    assert_eq!(explore[0].author.username, "mira");

    let by_text: Vec<Uuid> = feed
        .search(None, "ramen")
        .unwrap()
        .into_iter()
        .map(|item| item.post.id)
        .collect();
    assert_eq!(by_text, vec![ramen.id]);
    let by_tag: Vec<Uuid> = feed
        .search(None, "#food")
        .unwrap()
        .into_iter()
        .map(|item| item.post.id)
        .collect();
    assert_eq!(by_tag, vec![hike.id, ramen.id]);
    assert_eq!(feed.search(None, "  ").unwrap().len(), 4);

    let trending = feed.trending_hashtags(NOW).unwrap();
    assert_eq!(trending[0].tag, "food");
    assert_eq!(trending[0].count, 2);
    assert!(trending.iter().all(|tag| tag.tag != "retro"));

    let reels = feed.reels(None).unwrap();
    assert_eq!(reels.len(), 1);
    assert_eq!(reels[0].post.id, reel.id);
    let mut queue = ReelQueue::new(reels);
    assert!(!queue.next());
    assert_eq!(queue.current().map(|item| item.post.id), Some(reel.id));
}

#[test]
fn search_folds_case_beyond_ascii() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mira = profile(&store, "mira");
    let posts = PostService::new(store.clone(), FsBlobStore::new(dir.path(), "http://local"));
    let post = posts
        .create_post(mira.id, text_draft("Ärger im Café ÉTÉ", "#Zürich"), NOW)
        .unwrap();
    posts.create_post(mira.id, text_draft("plain", ""), NOW).unwrap();

    let feed = FeedService::new(store.clone());
    for query in ["ärger", "été", "CAFÉ", "#zürich"] {
        let found: Vec<Uuid> = feed
            .search(None, query)
            .unwrap()
            .into_iter()
            .map(|item| item.post.id)
            .collect();
        assert_eq!(found, vec![post.id], "query {query}");
    }
}

#[test]
fn following_feed_includes_own_and_followed_posts() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mira = profile(&store, "mira");
    let otto = profile(&store, "otto");
    let zed = profile(&store, "zed");
    let posts = PostService::new(store.clone(), FsBlobStore::new(dir.path(), "http://local"));
    let own = posts.create_post(mira.id, text_draft("mine", ""), NOW - 2).unwrap();
    let followed = posts.create_post(otto.id, text_draft("otto's", ""), NOW - 1).unwrap();
    posts.create_post(zed.id, text_draft("stranger", ""), NOW).unwrap();

    social_core::service::profile_service::ProfileService::new(store.clone())
        .follow(mira.id, otto.id)
        .unwrap();

    let ids: Vec<Uuid> = FeedService::new(store.clone())
        .following_feed(mira.id)
        .unwrap()
        .into_iter()
        .map(|item| item.post.id)
        .collect();
    assert_eq!(ids, vec![followed.id, own.id]);
}

#[test]
fn delete_post_requires_owner_and_removes_media() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let blobs = FsBlobStore::new(dir.path(), "http://local");
    let mira = profile(&store, "mira");
    let otto = profile(&store, "otto");
    let posts = PostService::new(store.clone(), blobs.clone());
    let post = posts
        .create_post(
            mira.id,
            PostDraft {
                media: Some(MediaUpload::new("a.jpg", "image/jpeg", vec![7])),
                ..text_draft("pic", "")
            },
            NOW,
        )
        .unwrap();
    posts.comment(otto.id, post.id, "nice").unwrap();

    let forbidden = posts.delete_post(otto.id, post.id);
    assert!(matches!(forbidden, Err(ServiceError::Forbidden(_))));

    posts.delete_post(mira.id, post.id).unwrap();
    assert!(store.get_post(post.id).unwrap().is_none());
    let path = format!("{}/{NOW}.jpg", mira.id);
    assert!(blobs.download(MEDIA_BUCKET, &path).is_err());

    let missing = posts.toggle_like(otto.id, post.id);
    assert!(matches!(missing, Err(ServiceError::NotFound { entity: "post", .. })));
}
