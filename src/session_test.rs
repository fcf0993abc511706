use super::*;

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::host::{LoginReentry, Notifier};
use crate::storage::MemoryTokenStore;
use crate::transport::TransportConfig;

#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("messages poisoned").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages
            .lock()
            .expect("messages poisoned")
            .push(message.to_owned());
    }
}

#[derive(Default)]
struct RecordingReentry {
    count: AtomicUsize,
}

impl LoginReentry for RecordingReentry {
    fn reenter_login(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    session: Session,
    transport: Transport,
    store: Arc<MemoryTokenStore>,
    notifier: Arc<RecordingNotifier>,
    reentry: Arc<RecordingReentry>,
}

fn harness(base_url: &str, stored_token: Option<&str>) -> Harness {
    let store = Arc::new(match stored_token {
        Some(t) => MemoryTokenStore::with_token(t),
        None => MemoryTokenStore::new(),
    });
    let notifier = Arc::new(RecordingNotifier::default());
    let reentry = Arc::new(RecordingReentry::default());
    let dyn_store: Arc<dyn TokenStore> = store.clone();
    let session = Session::init(dyn_store.clone());
    let config = TransportConfig::new(base_url).with_timeout(std::time::Duration::from_secs(5));
    let transport = Transport::new(
        &config,
        session.clone(),
        dyn_store,
        notifier.clone(),
        reentry.clone(),
    )
    .expect("transport construction");
    Harness { session, transport, store, notifier, reentry }
}

fn credentials() -> Credentials {
    Credentials { username: "admin".to_owned(), password: "admin123".to_owned() }
}

const LOGIN_BODY: &str = r#"{
    "token": "tok-abc",
    "user": {"id": 1, "username": "admin", "role": "admin"}
}"#;

fn assert_invariant(session: &Session) {
    assert!(
        !session.is_authenticated() || session.token().is_some(),
        "authenticated without a token"
    );
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn init_restores_token_but_not_authentication() {
    let h = harness("http://127.0.0.1:9", Some("prior"));
    assert_eq!(h.session.token(), Some("prior".to_owned()));
    assert!(!h.session.is_authenticated());
    assert!(h.session.current_user().is_none());
    assert_invariant(&h.session);
}

#[test]
fn init_with_empty_store_is_logged_out() {
    let h = harness("http://127.0.0.1:9", None);
    assert_eq!(h.session.token(), None);
    assert!(!h.session.is_authenticated());
    assert_invariant(&h.session);
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn login_success_applies_all_fields_together() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/auth/login")
        .match_body(mockito::Matcher::PartialJsonString(
            r#"{"username": "admin", "password": "admin123"}"#.to_owned(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(LOGIN_BODY)
        .create_async()
        .await;

    let h = harness(&server.url(), None);
    h.session
        .login(&h.transport, &credentials())
        .await
        .expect("login succeeds");

    mock.assert_async().await;
    assert!(h.session.is_authenticated());
    assert!(h.session.is_admin());
    assert_eq!(h.session.token(), Some("tok-abc".to_owned()));
    assert_eq!(h.store.load(), Some("tok-abc".to_owned()));
    let user = h.session.current_user().expect("user set");
    assert_eq!(user.username, "admin");
    // project_access omitted by the server defaults to empty.
    assert!(user.project_access.is_empty());
    assert_invariant(&h.session);
}

#[tokio::test]
async fn login_rejection_surfaces_server_message() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/auth/login")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"invalid password"}"#)
        .create_async()
        .await;

    let h = harness(&server.url(), None);
    let err = h
        .session
        .login(&h.transport, &credentials())
        .await
        .expect_err("login rejected");

    assert_eq!(err.message, "invalid password");
    // Nothing was applied.
    assert!(!h.session.is_authenticated());
    assert_eq!(h.session.token(), None);
    assert_eq!(h.store.load(), None);
    // The pipeline also notified once with the same text.
    assert_eq!(h.notifier.messages(), vec!["invalid password".to_owned()]);
    assert_invariant(&h.session);
}

#[tokio::test]
async fn login_rejection_without_message_is_generic() {
    let mut server = mockito::Server::new_async().await;
    server.mock("POST", "/auth/login").with_status(400).create_async().await;

    let h = harness(&server.url(), None);
    let err = h
        .session
        .login(&h.transport, &credentials())
        .await
        .expect_err("login rejected");

    assert_eq!(err.message, "login failed");
    assert!(!h.session.is_authenticated());
}

#[tokio::test]
async fn login_undecodable_success_body_fails_cleanly() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/auth/login")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let h = harness(&server.url(), None);
    let err = h
        .session
        .login(&h.transport, &credentials())
        .await
        .expect_err("login rejected");

    assert_eq!(err.message, "login failed");
    assert!(!h.session.is_authenticated());
    assert_eq!(h.store.load(), None);
    assert_invariant(&h.session);
}

#[tokio::test]
async fn login_network_failure_leaves_state_untouched() {
    let h = harness("http://127.0.0.1:9", None);
    let err = h
        .session
        .login(&h.transport, &credentials())
        .await
        .expect_err("login rejected");

    assert_eq!(err.message, "login failed");
    assert!(!h.session.is_authenticated());
    assert_eq!(h.notifier.messages(), vec!["network connection failed".to_owned()]);
}

// =============================================================================
// Logout
// =============================================================================

#[tokio::test]
async fn logout_clears_everything_and_is_idempotent() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/auth/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(LOGIN_BODY)
        .create_async()
        .await;

    let h = harness(&server.url(), None);
    h.session
        .login(&h.transport, &credentials())
        .await
        .expect("login succeeds");

    h.session.logout();
    assert!(!h.session.is_authenticated());
    assert_eq!(h.session.token(), None);
    assert!(h.session.current_user().is_none());
    assert_eq!(h.store.load(), None);

    // Second call from the cleared state changes nothing.
    h.session.logout();
    assert!(!h.session.is_authenticated());
    assert_eq!(h.session.token(), None);
    assert_eq!(h.store.load(), None);
    assert_invariant(&h.session);
}

#[test]
fn logout_when_never_logged_in_is_safe() {
    let h = harness("http://127.0.0.1:9", None);
    h.session.logout();
    h.session.logout();
    assert!(!h.session.is_authenticated());
}

// =============================================================================
// Revalidation
// =============================================================================

#[tokio::test]
async fn revalidate_without_token_skips_network() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/auth/me")
        .with_status(200)
        .expect(0)
        .create_async()
        .await;

    let h = harness(&server.url(), None);
    assert!(!h.session.revalidate(&h.transport).await);
    mock.assert_async().await;
}

#[tokio::test]
async fn revalidate_restores_identity_from_stored_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/auth/me")
        .match_header("authorization", "Bearer prior")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"user": {"id": 2, "username": "user1", "role": "user", "project_access": ["alpha"]}}"#)
        .create_async()
        .await;

    let h = harness(&server.url(), Some("prior"));
    assert!(h.session.revalidate(&h.transport).await);

    mock.assert_async().await;
    assert!(h.session.is_authenticated());
    assert!(!h.session.is_admin());
    let user = h.session.current_user().expect("user set");
    assert_eq!(user.username, "user1");
    assert_eq!(user.project_access, vec!["alpha".to_owned()]);
    assert_invariant(&h.session);
}

#[tokio::test]
async fn revalidate_rejection_clears_stored_token() {
    let mut server = mockito::Server::new_async().await;
    server.mock("GET", "/auth/me").with_status(401).create_async().await;

    let h = harness(&server.url(), Some("stale"));
    assert!(!h.session.revalidate(&h.transport).await);

    assert!(!h.session.is_authenticated());
    assert_eq!(h.session.token(), None);
    assert_eq!(h.store.load(), None);
    // The transport's credential-rejection path also told the host to
    // re-enter at login.
    assert_eq!(h.reentry.count.load(Ordering::SeqCst), 1);
    assert_eq!(
        h.notifier.messages(),
        vec!["authentication failed, please log in again".to_owned()]
    );
    assert_invariant(&h.session);
}

#[tokio::test]
async fn revalidate_network_failure_logs_out() {
    let h = harness("http://127.0.0.1:9", Some("prior"));
    assert!(!h.session.revalidate(&h.transport).await);
    assert!(!h.session.is_authenticated());
    assert_eq!(h.session.token(), None);
    assert_eq!(h.store.load(), None);
    assert_invariant(&h.session);
}

#[tokio::test]
async fn revalidate_undecodable_body_logs_out() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/auth/me")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let h = harness(&server.url(), Some("prior"));
    assert!(!h.session.revalidate(&h.transport).await);
    assert!(!h.session.is_authenticated());
    assert_eq!(h.store.load(), None);
    assert_invariant(&h.session);
}

// =============================================================================
// Round-trip — login then immediate revalidate keeps the role
// =============================================================================

#[tokio::test]
async fn login_then_revalidate_round_trip() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/auth/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(LOGIN_BODY)
        .create_async()
        .await;
    server
        .mock("GET", "/auth/me")
        .match_header("authorization", "Bearer tok-abc")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"user": {"id": 1, "username": "admin", "role": "admin"}}"#)
        .create_async()
        .await;

    let h = harness(&server.url(), None);
    h.session
        .login(&h.transport, &credentials())
        .await
        .expect("login succeeds");
    let role_before = h.session.current_user().expect("user").role;

    assert!(h.session.revalidate(&h.transport).await);
    let role_after = h.session.current_user().expect("user").role;
    assert_eq!(role_before, role_after);
    assert!(h.session.is_authenticated());
    assert_invariant(&h.session);
}

// =============================================================================
// Snapshot projection
// =============================================================================

#[tokio::test]
async fn snapshot_reflects_session_state() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/auth/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(LOGIN_BODY)
        .create_async()
        .await;

    let h = harness(&server.url(), None);
    let before = h.session.snapshot();
    assert!(!before.authenticated);
    assert!(before.role.is_none());
    assert!(!before.is_admin());

    h.session
        .login(&h.transport, &credentials())
        .await
        .expect("login succeeds");

    let after = h.session.snapshot();
    assert!(after.authenticated);
    assert_eq!(after.role.as_deref(), Some("admin"));
    assert!(after.is_admin());
}
