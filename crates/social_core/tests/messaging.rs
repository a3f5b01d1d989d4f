use social_core::db::open_db_in_memory;
use social_core::model::enums::{MessageStatus, NotificationType};
use social_core::model::profile::{NewProfile, Profile};
use social_core::repo::notification_repo::NotificationRepository;
use social_core::repo::profile_repo::ProfileRepository;
use social_core::service::message_service::{MessageService, MessagesPane};
use social_core::{ServiceError, SqliteStore};
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
fn send_trims_and_notifies_the_receiver() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mira = profile(&store, "mira");
    let otto = profile(&store, "otto");
    let service = MessageService::new(store.clone());

    let message = service.send(otto.id, mira.id, "  hi there  ").unwrap();
    assert_eq!(message.content, "hi there");
    assert_eq!(message.status, MessageStatus::Sent);

    let notifications = store.list_notifications(mira.id, None).unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationType::Message);
    assert_eq!(notifications[0].content, "otto sent you a message");
}

#[test]
fn send_rejects_blank_text_and_unknown_receiver() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mira = profile(&store, "mira");
    let service = MessageService::new(store.clone());

    let nobody = Uuid::new_v4();
    let unknown = service.send(mira.id, nobody, "hello?");
    assert!(matches!(
        unknown,
        Err(ServiceError::NotFound { entity: "profile", id }) if id == nobody
    ));

    let otto = profile(&store, "otto");
    let blank = service.send(mira.id, otto.id, "   ");
    assert!(matches!(blank, Err(ServiceError::InvalidInput(_))));
}

#[test]
fn conversations_group_by_counterpart_with_unread_counts() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mira = profile(&store, "mira");
    let otto = profile(&store, "otto");
    let zed = profile(&store, "zed");
    let service = MessageService::new(store.clone());

    service.send(otto.id, mira.id, "one").unwrap();
    service.send(otto.id, mira.id, "two").unwrap();
    service.send(zed.id, mira.id, "yo").unwrap();

    let conversations = service.conversations(mira.id).unwrap();
    assert_eq!(conversations.len(), 2);
    assert_eq!(conversations[0].other.username, "zed");
    assert_eq!(conversations[0].unread_count, 1);
    assert_eq!(conversations[1].other.username, "otto");
    assert_eq!(conversations[1].last_message.content, "two");
    assert_eq!(conversations[1].unread_count, 2);

    service.send(mira.id, otto.id, "hey!").unwrap();
    let conversations = service.conversations(mira.id).unwrap();
    assert_eq!(conversations[0].other.username, "otto");
    assert_eq!(conversations[0].last_message.content, "hey!");
    assert_eq!(conversations[0].unread_count, 0);

    let thread: Vec<String> = service
        .thread(mira.id, otto.id)
        .unwrap()
        .into_iter()
        .map(|message| message.content)
        .collect();
    assert_eq!(thread, vec!["one", "two", "hey!"]);
}

#[test]
fn ignored_messages_no_longer_count_as_unread() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mira = profile(&store, "mira");
    let otto = profile(&store, "otto");
    let service = MessageService::new(store.clone());
    service.send(otto.id, mira.id, "buy coins").unwrap();
    service.send(otto.id, mira.id, "please").unwrap();

    assert_eq!(service.ignore(mira.id, otto.id).unwrap(), 2);
    let conversations = service.conversations(mira.id).unwrap();
    assert_eq!(conversations[0].unread_count, 0);
    assert!(service
        .thread(mira.id, otto.id)
        .unwrap()
        .iter()
        .all(|message| message.status == MessageStatus::Ignored));
}

#[test]
fn pane_reloads_on_relevant_inserts_only() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mira = profile(&store, "mira");
    let otto = profile(&store, "otto");
    let zed = profile(&store, "zed");

    let mut pane =
        MessagesPane::open(MessageService::new(store.clone()), store.feed(), mira.id).unwrap();
    assert!(pane.conversations().is_empty());
    assert!(pane.selected().is_none());

    let others = MessageService::new(store.clone());
    others.send(otto.id, zed.id, "not for mira").unwrap();
    assert!(!pane.refresh_if_changed().unwrap());

    others.send(otto.id, mira.id, "ping").unwrap();
    assert!(pane.refresh_if_changed().unwrap());
    assert_eq!(pane.conversations().len(), 1);

    assert_eq!(pane.select(otto.id).unwrap().len(), 1);
    others.send(otto.id, mira.id, "still there?").unwrap();
    assert!(pane.refresh_if_changed().unwrap());
    assert_eq!(pane.thread().len(), 2);

    let reply = pane.send("yes").unwrap();
    assert_eq!(reply.receiver_id, otto.id);
    assert_eq!(pane.thread().len(), 3);
    assert_eq!(pane.conversations()[0].last_message.id, reply.id);
}

#[test]
fn pane_send_requires_a_selection() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mira = profile(&store, "mira");

    let mut pane =
        MessagesPane::open(MessageService::new(store.clone()), store.feed(), mira.id).unwrap();
    assert!(matches!(pane.send("hello"), Err(ServiceError::InvalidInput(_))));
}
