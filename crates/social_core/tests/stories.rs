use social_core::db::open_db_in_memory;
use social_core::model::profile::{NewProfile, Profile};
use social_core::model::{DAY_MS, HOUR_MS};
use social_core::repo::profile_repo::ProfileRepository;
use social_core::repo::story_repo::StoryRepository;
use social_core::service::story_service::StoryService;
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

#[test]
fn create_story_uploads_and_expires_after_a_day() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let blobs = FsBlobStore::new(dir.path(), "http://local/storage");
    let mira = profile(&store, "mira");
    let stories = StoryService::new(store.clone(), blobs.clone());

    let story = stories
        .create_story(
            mira.id,
            &MediaUpload::new("clip.mp4", "video/mp4", vec![4, 5, 6]),
            Some("  morning run "),
            NOW,
        )
        .unwrap();
    assert_eq!(story.content.as_deref(), Some("morning run"));
    assert_eq!(story.media_type.as_deref(), Some("video"));
    assert_eq!(story.expires_at, NOW + DAY_MS);

    let path = format!("{}/{NOW}.mp4", mira.id);
    assert_eq!(
        story.media_url,
        format!("http://local/storage/{MEDIA_BUCKET}/{path}")
    );
    assert_eq!(blobs.download(MEDIA_BUCKET, &path).unwrap(), vec![4, 5, 6]);

    let empty = stories.create_story(
        mira.id,
        &MediaUpload::new("empty.png", "image/png", Vec::new()),
        None,
        NOW,
    );
    assert!(matches!(empty, Err(ServiceError::InvalidMedia(_))));
}

#[test]
fn failed_story_insert_removes_uploaded_media() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let blobs = FsBlobStore::new(dir.path(), "http://local");
    let stories = StoryService::new(store.clone(), blobs.clone());
    let ghost = Uuid::new_v4();

    let result = stories.create_story(
        ghost,
        &MediaUpload::new("a.png", "image/png", vec![1, 2]),
        None,
        NOW,
    );
    assert!(result.is_err());

    let path = format!("{ghost}/{NOW}.png");
    assert!(blobs.download(MEDIA_BUCKET, &path).is_err());
    assert!(store.list_active_stories(NOW, None).unwrap().is_empty());
}

#[test]
fn active_stories_hide_expired_ones() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mira = profile(&store, "mira");
    let otto = profile(&store, "otto");
    let stories = StoryService::new(store.clone(), FsBlobStore::new(dir.path(), "http://local"));
    let image = MediaUpload::new("a.jpg", "image/jpeg", vec![1]);

    let old = stories
        .create_story(mira.id, &image, None, NOW - DAY_MS - HOUR_MS)
        .unwrap();
    let fresh = stories.create_story(otto.id, &image, None, NOW - HOUR_MS).unwrap();
    let newest = stories.create_story(mira.id, &image, None, NOW).unwrap();

    let active = stories.active_stories(NOW).unwrap();
    let ids: Vec<Uuid> = active.iter().map(|view| view.story.id).collect();
    assert_eq!(ids, vec![newest.id, fresh.id]);
    assert_eq!(active[1].author.username, "otto");
    assert_eq!(active[0].story.media_type.as_deref(), Some("image"));

    assert_eq!(stories.purge_expired(NOW).unwrap(), 1);
    assert!(store.get_story(old.id).unwrap().is_none());
    assert_eq!(stories.purge_expired(NOW).unwrap(), 0);
}

#[test]
fn stories_track_views_likes_and_comments() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mira = profile(&store, "mira");
    let otto = profile(&store, "otto");
    let stories = StoryService::new(store.clone(), FsBlobStore::new(dir.path(), "http://local"));
    let story = stories
        .create_story(mira.id, &MediaUpload::new("a.png", "image/png", vec![1]), None, NOW)
        .unwrap();

    assert_eq!(stories.view_story(story.id).unwrap(), 1);
    assert_eq!(stories.view_story(story.id).unwrap(), 2);

    let liked = stories.like_story(otto.id, story.id).unwrap();
    assert!(liked.liked);
    assert_eq!(liked.like_count, 1);
    let unliked = stories.like_story(otto.id, story.id).unwrap();
    assert!(!unliked.liked);
    assert_eq!(unliked.like_count, 0);

    let comment = stories.comment_story(otto.id, story.id, " wow ").unwrap();
    assert_eq!(comment.content, "wow");

    let stored = store.get_story(story.id).unwrap().unwrap();
    assert_eq!(stored.view_count, 2);
    assert_eq!(stored.like_count, 0);
    assert_eq!(stored.comment_count, 1);

    let missing = stories.view_story(Uuid::new_v4());
    assert!(matches!(
        missing,
        Err(ServiceError::NotFound { entity: "story", .. })
    ));
}

#[test]
fn purging_a_story_removes_its_engagement() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mira = profile(&store, "mira");
    let otto = profile(&store, "otto");
    let stories = StoryService::new(store.clone(), FsBlobStore::new(dir.path(), "http://local"));
    let story = stories
        .create_story(mira.id, &MediaUpload::new("a.png", "image/png", vec![1]), None, NOW)
        .unwrap();
    stories.like_story(otto.id, story.id).unwrap();
    stories.comment_story(otto.id, story.id, "nice").unwrap();

    assert_eq!(stories.purge_expired(NOW + DAY_MS).unwrap(), 1);
    let leftovers: i64 = conn
        .query_row(
            "SELECT (SELECT COUNT(*) FROM likes) + (SELECT COUNT(*) FROM comments);",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(leftovers, 0);
}
