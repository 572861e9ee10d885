//! Status propagation must never regress under retries

use std::sync::Arc;
use std::time::Duration;
use taskherd::master::ensure_structure;
use taskherd::session::memory::{Fault, FaultKind, MemoryNamespace, MemorySession, OpKind};
use taskherd::session::Session;
use taskherd::worker::Registrar;

async fn registered_worker(
    ns: &Arc<MemoryNamespace>,
    retry_delay: Duration,
) -> (Arc<MemorySession>, Registrar) {
    let boot = ns.session(Duration::from_secs(15));
    ensure_structure(boot.as_ref(), Duration::from_millis(1))
        .await
        .unwrap();

    let session = ns.session(Duration::from_secs(15));
    let registrar = Registrar::new(session.clone() as Arc<dyn Session>, "w1")
        .with_retry_delay(retry_delay);
    registrar.register().await.unwrap();
    (session, registrar)
}

#[tokio::test]
async fn test_settled_status_is_newest_despite_delayed_older_update() {
    let ns = MemoryNamespace::new();
    let (session, registrar) = registered_worker(&ns, Duration::from_millis(200)).await;

    // s1's update attempt fails with connection loss and will retry
    // only after the 200ms delay; s2 and s3 land inside that window.
    // The retried s1 must abandon, not clobber.
    session.inject_fault(Fault::new(OpKind::Update, FaultKind::Drop));
    let h1 = registrar.set_status("s1");
    tokio::time::sleep(Duration::from_millis(50)).await;
    let h2 = registrar.set_status("s2");
    let h3 = registrar.set_status("s3");

    h3.await.unwrap();
    h2.await.unwrap();
    h1.await.unwrap();

    let (payload, _) = session.read("/workers/worker-w1").await.unwrap();
    assert_eq!(payload, b"s3");
}

#[tokio::test]
async fn test_lost_ack_retry_settles_on_same_status() {
    let ns = MemoryNamespace::new();
    let (session, registrar) = registered_worker(&ns, Duration::from_millis(5)).await;

    // The update applies but the ack is lost; the retried write of
    // the same (still latest) status is harmless.
    session.inject_fault(Fault::new(OpKind::Update, FaultKind::DropAck));
    registrar.set_status("Busy").await.unwrap();

    let (payload, _) = session.read("/workers/worker-w1").await.unwrap();
    assert_eq!(payload, b"Busy");
}

#[tokio::test]
async fn test_presence_vanishes_with_session() {
    let ns = MemoryNamespace::new();
    let (session, registrar) = registered_worker(&ns, Duration::from_millis(5)).await;
    let path = registrar.status_path().to_string();

    let observer = ns.session(Duration::from_secs(15));
    assert!(observer.read(&path).await.is_ok());

    session.expire();
    assert!(observer.read(&path).await.is_err());
}
