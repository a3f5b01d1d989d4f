use social_core::db::open_db_in_memory;
use social_core::model::HOUR_MS;
use social_core::repo::account_repo::{AccountRepository, SessionRecord};
use social_core::repo::profile_repo::ProfileRepository;
use social_core::{AuthError, AuthService, SqliteStore};

#[test]
fn sign_up_creates_profile_and_session() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let auth = AuthService::new(store.clone());

    let (profile, session) = auth
        .sign_up(" Mira@Example.com ", "sunsets-and-tea", "Mira", Some("Mira Lane"))
        .unwrap();
    assert_eq!(profile.username, "mira");
    assert_eq!(profile.full_name.as_deref(), Some("Mira Lane"));
    assert_eq!(session.profile_id, profile.id);
    assert!(store.get_profile(profile.id).unwrap().is_some());

    let resolved = auth
        .current_session(&session.token, session.expires_at - 1)
        .unwrap();
    assert_eq!(resolved, session);
}

#[test]
fn sign_up_rejects_taken_email_and_username() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let auth = AuthService::new(store.clone());
    auth.sign_up("mira@example.com", "sunsets-and-tea", "mira", None)
        .unwrap();

    let email = auth.sign_up("MIRA@example.com", "another-pass", "mira2", None);
    assert!(matches!(email, Err(AuthError::EmailTaken)));
    let username = auth.sign_up("otto@example.com", "another-pass", "Mira", None);
    assert!(matches!(username, Err(AuthError::UsernameTaken)));
    assert!(store.get_profile_by_username("mira2").unwrap().is_none());
}

#[test]
fn sign_up_validates_input() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let auth = AuthService::new(store.clone());

    assert!(matches!(
        auth.sign_up("not-an-email", "long-enough", "mira", None),
        Err(AuthError::InvalidEmail)
    ));
    assert!(matches!(
        auth.sign_up("mira@example.com", "short", "mira", None),
        Err(AuthError::WeakPassword)
    ));
    assert!(store.get_profile_by_username("mira").unwrap().is_none());
}

#[test]
fn sign_in_checks_password_and_sign_out_revokes() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let auth = AuthService::new(store.clone());
    let (profile, first) = auth
        .sign_up("mira@example.com", "sunsets-and-tea", "mira", None)
        .unwrap();

    assert!(matches!(
        auth.sign_in("mira@example.com", "wrong-password"),
        Err(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        auth.sign_in("nobody@example.com", "sunsets-and-tea"),
        Err(AuthError::InvalidCredentials)
    ));

    let second = auth.sign_in("MIRA@example.com", "sunsets-and-tea").unwrap();
    assert_eq!(second.profile_id, profile.id);
    assert_ne!(second.token, first.token);

    auth.sign_out(&second.token).unwrap();
    assert!(matches!(
        auth.current_session(&second.token, second.expires_at - 1),
        Err(AuthError::SessionExpired)
    ));
    assert!(auth
        .current_session(&first.token, first.expires_at - 1)
        .is_ok());
    auth.sign_out("unknown-token").unwrap();
}

#[test]
fn expired_sessions_do_not_resolve() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let auth = AuthService::with_session_ttl_hours(store.clone(), 1);
    let (_, session) = auth
        .sign_up("mira@example.com", "sunsets-and-tea", "mira", None)
        .unwrap();
    let issued_at = session.expires_at - HOUR_MS;

    assert!(auth.current_session(&session.token, issued_at).is_ok());
    assert!(matches!(
        auth.current_session(&session.token, session.expires_at),
        Err(AuthError::SessionExpired)
    ));
    assert!(matches!(
        auth.current_session(&session.token, issued_at),
        Err(AuthError::SessionExpired)
    ));
}

#[test]
fn sign_in_sweeps_expired_sessions() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let auth = AuthService::new(store.clone());
    let (profile, live) = auth
        .sign_up("mira@example.com", "sunsets-and-tea", "mira", None)
        .unwrap();
    store
        .create_session(&SessionRecord {
            token: "stale-token".to_string(),
            profile_id: profile.id,
            created_at: 1_000,
            expires_at: 1_000 + HOUR_MS,
        })
        .unwrap();

    let fresh = auth.sign_in("mira@example.com", "sunsets-and-tea").unwrap();
    assert!(store.get_session("stale-token").unwrap().is_none());
    assert!(store.get_session(&live.token).unwrap().is_some());
    assert!(store.get_session(&fresh.token).unwrap().is_some());
}
