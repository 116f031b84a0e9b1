//! End-to-end tests: a `Session` driving the real server router over
//! loopback HTTP, with an in-memory database behind it.

use tokio::sync::mpsc::UnboundedReceiver;

use taskforge_client::events::SessionEvent;
use taskforge_client::{ClientError, Session};
use taskforge_server::api::{build_router, AppState};
use taskforge_shared::protocol::{ProfilePatch, TaskPatch};
use taskforge_shared::types::Priority;
use taskforge_store::Database;

async fn spawn_server() -> String {
    let db = Database::open_in_memory().expect("in-memory db");
    let router = build_router(AppState::new(db));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn signed_in_session() -> (Session, UnboundedReceiver<SessionEvent>, tempfile::TempDir) {
    let base_url = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let (session, rx) =
        Session::with_settings_path(base_url, dir.path().join("settings.json")).unwrap();

    session
        .login(
            "google",
            r#"{"sub":"sub-1","email":"alice@example.com","name":"Alice"}"#,
        )
        .await
        .expect("login");
    (session, rx, dir)
}

fn drain(rx: &mut UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn first_login_creates_the_default_list() {
    let (session, _rx, _dir) = signed_in_session().await;

    let snapshot = session.store().snapshot();
    let user = snapshot.user.as_ref().expect("user set");
    assert_eq!(user.level, 1);
    assert_eq!(user.xp, 0);

    assert_eq!(snapshot.lists.len(), 1);
    assert_eq!(snapshot.lists[0].name, "My Tasks");
    assert!(snapshot.tasks.is_empty());
}

#[tokio::test]
async fn second_login_reuses_the_user() {
    let base_url = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let credential = r#"{"sub":"sub-x","email":"x@example.com","name":"X"}"#;

    let (first, _rx1) =
        Session::with_settings_path(base_url.clone(), dir.path().join("a.json")).unwrap();
    let user_a = first.login("google", credential).await.unwrap();

    let (second, _rx2) =
        Session::with_settings_path(base_url, dir.path().join("b.json")).unwrap();
    let user_b = second.login("google", credential).await.unwrap();

    assert_eq!(user_a.id, user_b.id);
    // No duplicate default list.
    assert_eq!(second.store().snapshot().lists.len(), 1);
}

#[tokio::test]
async fn blocked_completion_is_rejected_without_mutation() {
    let (session, mut rx, _dir) = signed_in_session().await;
    let list_id = session.store().snapshot().lists[0].id;

    let blocker = session.add_task(list_id, "U").await.unwrap();
    let blocked = session.add_task(list_id, "T").await.unwrap();
    session
        .update_task(
            blocked.id,
            &TaskPatch {
                blocked_by: Some(vec![blocker.id]),
                ..TaskPatch::default()
            },
        )
        .await
        .unwrap();
    drain(&mut rx);

    let err = session.toggle_completed(blocked.id).await.unwrap_err();
    assert!(matches!(err, ClientError::Blocked));
    assert!(drain(&mut rx).contains(&SessionEvent::TaskBlocked {
        task_id: blocked.id
    }));

    // Nothing was sent: the server still has it incomplete, and so does
    // the local store.
    let snapshot = session.store().snapshot();
    let local = snapshot.tasks.iter().find(|t| t.id == blocked.id).unwrap();
    assert!(!local.completed);
    session.refresh_all().await.unwrap();
    let snapshot = session.store().snapshot();
    assert!(!snapshot.tasks.iter().find(|t| t.id == blocked.id).unwrap().completed);

    // Completing the blocker releases the gate.
    session.toggle_completed(blocker.id).await.unwrap();
    let done = session.toggle_completed(blocked.id).await.unwrap();
    assert!(done.completed);
}

#[tokio::test]
async fn completing_a_high_task_at_90_xp_levels_up() {
    let (session, mut rx, _dir) = signed_in_session().await;
    let list_id = session.store().snapshot().lists[0].id;

    session
        .update_profile(&ProfilePatch {
            xp: Some(90),
            ..ProfilePatch::default()
        })
        .await
        .unwrap();

    let task = session.add_task(list_id, "ship it").await.unwrap();
    session.set_priority(task.id, Priority::High).await.unwrap();
    drain(&mut rx);

    session.toggle_completed(task.id).await.unwrap();

    let user = session.store().snapshot().user.clone().unwrap();
    assert_eq!(user.level, 2);
    assert_eq!(user.xp, 40);
    assert!(drain(&mut rx).contains(&SessionEvent::LevelUp { level: 2 }));
}

#[tokio::test]
async fn completing_a_low_task_just_gains_xp() {
    let (session, mut rx, _dir) = signed_in_session().await;
    let list_id = session.store().snapshot().lists[0].id;

    let task = session.add_task(list_id, "water plants").await.unwrap();
    drain(&mut rx);

    session.toggle_completed(task.id).await.unwrap();

    let user = session.store().snapshot().user.clone().unwrap();
    assert_eq!(user.level, 1);
    assert_eq!(user.xp, 10);
    assert!(drain(&mut rx).contains(&SessionEvent::XpGained { amount: 10 }));
}

#[tokio::test]
async fn uncompleting_awards_nothing() {
    let (session, mut rx, _dir) = signed_in_session().await;
    let list_id = session.store().snapshot().lists[0].id;

    let task = session.add_task(list_id, "t").await.unwrap();
    session.toggle_completed(task.id).await.unwrap();
    let xp_after_complete = session.store().snapshot().user.clone().unwrap().xp;
    drain(&mut rx);

    let reopened = session.toggle_completed(task.id).await.unwrap();
    assert!(!reopened.completed);
    assert_eq!(
        session.store().snapshot().user.clone().unwrap().xp,
        xp_after_complete
    );
    let events = drain(&mut rx);
    assert!(!events
        .iter()
        .any(|e| matches!(e, SessionEvent::XpGained { .. } | SessionEvent::LevelUp { .. })));
}

#[tokio::test]
async fn deleting_a_list_cascades_to_its_tasks() {
    let (session, _rx, _dir) = signed_in_session().await;

    let list = session.add_list("Project").await.unwrap();
    let t1 = session.add_task(list.id, "t1").await.unwrap();
    let t2 = session.add_task(list.id, "t2").await.unwrap();

    session.delete_list(list.id).await.unwrap();

    // Locally gone...
    let snapshot = session.store().snapshot();
    assert!(!snapshot.tasks.iter().any(|t| t.id == t1.id || t.id == t2.id));

    // ...and gone from the server as well.
    session.refresh_all().await.unwrap();
    let snapshot = session.store().snapshot();
    assert!(!snapshot.tasks.iter().any(|t| t.id == t1.id || t.id == t2.id));
    assert!(!snapshot.lists.iter().any(|l| l.id == list.id));
}

#[tokio::test]
async fn subtasks_are_read_modify_write_on_the_parent() {
    let (session, _rx, _dir) = signed_in_session().await;
    let list_id = session.store().snapshot().lists[0].id;

    let task = session.add_task(list_id, "parent").await.unwrap();
    session.add_subtask(task.id, "one").await.unwrap();
    let with_two = session.add_subtask(task.id, "two").await.unwrap();

    assert_eq!(with_two.subtasks.len(), 2);
    let first = with_two.subtasks[0].clone();

    let toggled = session.toggle_subtask(task.id, first.id).await.unwrap();
    assert!(toggled.subtasks[0].completed);
    assert!(!toggled.subtasks[1].completed);
}

#[tokio::test]
async fn empty_titles_are_rejected_locally_and_remotely() {
    let (session, _rx, _dir) = signed_in_session().await;
    let list_id = session.store().snapshot().lists[0].id;

    assert!(matches!(
        session.add_task(list_id, "   ").await.unwrap_err(),
        ClientError::Validation(_)
    ));
    assert!(matches!(
        session.add_list("").await.unwrap_err(),
        ClientError::Validation(_)
    ));

    // The server enforces it too, for clients that skip the local check.
    let task = session.add_task(list_id, "real").await.unwrap();
    let err = session
        .update_task(
            task.id,
            &TaskPatch {
                title: Some(String::new()),
                ..TaskPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn self_blocking_is_rejected() {
    let (session, _rx, _dir) = signed_in_session().await;
    let list_id = session.store().snapshot().lists[0].id;
    let task = session.add_task(list_id, "loop").await.unwrap();

    let err = session
        .update_task(
            task.id,
            &TaskPatch {
                blocked_by: Some(vec![task.id]),
                ..TaskPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn stale_token_surfaces_as_session_expired() {
    let base_url = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let (session, mut rx) =
        Session::with_settings_path(base_url, dir.path().join("s.json")).unwrap();

    let err = session.resume("not-a-real-token".into()).await.unwrap_err();
    assert!(matches!(err, ClientError::Auth(_)));
    assert!(drain(&mut rx).contains(&SessionEvent::SessionExpired));
    assert!(!session.is_signed_in());
}

#[tokio::test]
async fn timer_flushes_into_time_spent_before_switching_tasks() {
    let (session, _rx, _dir) = signed_in_session().await;
    let list_id = session.store().snapshot().lists[0].id;

    let first = session.add_task(list_id, "deep work").await.unwrap();
    let second = session.add_task(list_id, "email").await.unwrap();

    session.start_timer(first.id).await.unwrap();
    for _ in 0..3 {
        session.tick_timer();
    }

    // Switching flushes the running timer first.
    session.start_timer(second.id).await.unwrap();
    assert_eq!(session.active_timer_task(), Some(second.id));

    let snapshot = session.store().snapshot();
    let flushed = snapshot.tasks.iter().find(|t| t.id == first.id).unwrap();
    assert_eq!(flushed.time_spent, 3);

    // Stopping banks on top of the stored value.
    session.tick_timer();
    session.tick_timer();
    let stopped = session.stop_timer().await.unwrap().unwrap();
    assert_eq!(stopped.id, second.id);
    assert_eq!(stopped.time_spent, 2);
    assert!(session.active_timer_task().is_none());
}

#[tokio::test]
async fn operations_without_a_session_fail_fast() {
    let base_url = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let (session, _rx) =
        Session::with_settings_path(base_url, dir.path().join("s.json")).unwrap();

    assert!(matches!(
        session.add_list("anything").await.unwrap_err(),
        ClientError::NotSignedIn
    ));
}
