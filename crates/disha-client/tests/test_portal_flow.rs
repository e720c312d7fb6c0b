//! End-to-end scenario: a signed-in student hits an admin-only
//! destination, mis-submits an empty chat prompt, and rotates a
//! two-item notification banner, with the session restored from disk
//! the way a page reload would.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use disha_client::chat::{ChatExchange, ChatTransport, ChunkStream};
use disha_client::poller::{NotificationPoller, NotificationSource};
use disha_core::error::{DishaError, Result};
use disha_core::feed::Notification;
use disha_core::guard::{Route, Verdict, decide, decide_route};
use disha_core::session::{Identity, Role, Session};
use disha_infrastructure::{DishaPaths, SessionStore};

struct CountingTransport {
    opens: AtomicUsize,
}

#[async_trait]
impl ChatTransport for CountingTransport {
    async fn open(&self, _query: &str) -> Result<ChunkStream> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Err(DishaError::transport("not under test"))
    }
}

struct TwoItemSource;

#[async_trait]
impl NotificationSource for TwoItemSource {
    async fn latest(&self) -> Result<Vec<Notification>> {
        Ok(vec![
            Notification {
                author: "TNP Admin".to_string(),
                message: "Campus drive on Friday".to_string(),
                created_at: None,
            },
            Notification {
                author: "TNP Admin".to_string(),
                message: "Pre-placement talk at 4pm".to_string(),
                created_at: None,
            },
        ])
    }
}

#[tokio::test]
async fn student_session_flows_through_guard_chat_and_feed() {
    // Session persisted by a login, then restored as after a reload.
    let dir = tempfile::TempDir::new().unwrap();
    let paths = DishaPaths::with_root(dir.path());
    let store = SessionStore::open(&paths);
    store
        .set(Session::signed_in(
            Role::Student,
            Identity {
                display_name: "Asha Verma".to_string(),
                department: "Computer Science".to_string(),
                id: "asha@college.edu".to_string(),
            },
        ))
        .unwrap();
    let session = SessionStore::open(&paths).get();
    assert!(session.is_authenticated());

    // An admin-only destination bounces the student to their home.
    assert_eq!(
        decide(&session, &[Role::Admin]),
        Verdict::Redirect(Route::StudentHome)
    );
    assert_eq!(
        decide_route(&session, Route::AdminHome),
        Verdict::Redirect(Route::StudentHome)
    );

    // An empty prompt performs no network call and leaves the
    // transcript unchanged.
    let transport = Arc::new(CountingTransport {
        opens: AtomicUsize::new(0),
    });
    let (exchange, _events) = ChatExchange::new(transport.clone());
    assert!(exchange.send("").unwrap_err().is_validation());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(transport.opens.load(Ordering::SeqCst), 0);
    assert!(exchange.transcript().messages().is_empty());

    // Two notifications: advancing twice wraps back to the start.
    let poller =
        NotificationPoller::with_interval(Arc::new(TwoItemSource), Duration::from_secs(3600));
    let mut snapshots = poller.subscribe();
    let handle = poller.start();
    snapshots.changed().await.unwrap();

    let start = poller.feed().cursor();
    poller.advance();
    assert_ne!(poller.feed().cursor(), start);
    poller.advance();
    assert_eq!(poller.feed().cursor(), start);
    handle.stop();

    // Signing out clears the persisted session.
    store.clear().unwrap();
    assert_eq!(SessionStore::open(&paths).get(), Session::Anonymous);
}
