use social_core::db::open_db_in_memory;
use social_core::model::enums::NotificationType;
use social_core::model::profile::{NewProfile, Profile, ProfileUpdate};
use social_core::repo::follow_repo::FollowRepository;
use social_core::repo::notification_repo::NotificationRepository;
use social_core::repo::profile_repo::ProfileRepository;
use social_core::service::profile_service::{ProfileRef, ProfileService};
use social_core::{RepoError, ServiceError, SqliteStore};
use uuid::Uuid;

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
fn new_profiles_start_empty_and_usernames_are_unique() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();

    let mira = profile(&store, "Mira");
    assert_eq!(mira.username, "mira");
    assert_eq!(mira.coins, 0);
    assert_eq!(mira.follower_count, 0);
    assert!(!mira.is_vip);

    let err = store
        .create_profile(&NewProfile {
            id: Uuid::new_v4(),
            username: "mira".to_string(),
            full_name: None,
        })
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));

    let by_name = store.get_profile_by_username("MIRA").unwrap().unwrap();
    assert_eq!(by_name.id, mira.id);
}

#[test]
fn update_profile_changes_only_given_fields() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mira = profile(&store, "mira");

    let updated = store
        .update_profile(
            mira.id,
            &ProfileUpdate {
                bio: Some(Some("café hopper".to_string())),
                ..ProfileUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(updated.bio.as_deref(), Some("café hopper"));
    assert_eq!(updated.username, "mira");

    let missing = store.update_profile(
        Uuid::new_v4(),
        &ProfileUpdate {
            bio: Some(None),
            ..ProfileUpdate::default()
        },
    );
    assert!(matches!(missing, Err(RepoError::NotFound { .. })));
}

#[test]
fn search_matches_username_prefix() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    profile(&store, "mira");
    profile(&store, "miles");
    profile(&store, "otto");

    let service = ProfileService::new(store.clone());
    let found: Vec<String> = service
        .search("MI")
        .unwrap()
        .into_iter()
        .map(|profile| profile.username)
        .collect();
    assert_eq!(found.len(), 2);
    assert!(found.contains(&"mira".to_string()));
    assert!(found.contains(&"miles".to_string()));
}

#[test]
fn follow_is_idempotent_and_keeps_counters() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mira = profile(&store, "mira");
    let otto = profile(&store, "otto");
    let service = ProfileService::new(store.clone());

    let first = service.follow(mira.id, otto.id).unwrap();
    assert!(first.changed);
    assert_eq!(first.follower_count, 1);
    let again = service.follow(mira.id, otto.id).unwrap();
    assert!(!again.changed);
    assert_eq!(again.follower_count, 1);

    let otto_now = store.get_profile(otto.id).unwrap().unwrap();
    let mira_now = store.get_profile(mira.id).unwrap().unwrap();
    assert_eq!(otto_now.follower_count, 1);
    assert_eq!(mira_now.following_count, 1);
    assert_eq!(store.follower_ids(otto.id).unwrap(), vec![mira.id]);

    let notifications = store.list_notifications(otto.id, None).unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationType::Follow);
    assert_eq!(notifications[0].actor_id, Some(mira.id));

    let undone = service.unfollow(mira.id, otto.id).unwrap();
    assert!(undone.changed);
    assert_eq!(undone.follower_count, 0);
    assert!(!store.is_following(mira.id, otto.id).unwrap());
    assert!(!service.unfollow(mira.id, otto.id).unwrap().changed);
}

#[test]
fn self_follow_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mira = profile(&store, "mira");
    let service = ProfileService::new(store.clone());

    let err = service.follow(mira.id, mira.id).unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[test]
fn profile_page_reports_relationship() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mira = profile(&store, "mira");
    let otto = profile(&store, "otto");
    let service = ProfileService::new(store.clone());
    service.follow(mira.id, otto.id).unwrap();

    let page = service
        .profile_page(Some(mira.id), &ProfileRef::parse("@otto"))
        .unwrap();
    assert_eq!(page.profile.id, otto.id);
    assert!(page.is_following);
    assert!(!page.is_own);
    assert!(page.posts.is_empty());

    let own = service
        .profile_page(Some(mira.id), &ProfileRef::Id(mira.id))
        .unwrap();
    assert!(own.is_own);
    assert!(!own.is_following);

    let unknown = service.profile_page(None, &ProfileRef::parse("nobody"));
    assert!(matches!(unknown, Err(ServiceError::UnknownUsername(name)) if name == "nobody"));
}
