//! Admin snapshot of a live cluster

use std::sync::Arc;
use std::time::Duration;
use taskherd::admin;
use taskherd::master::{Elector, MasterState};
use taskherd::session::memory::MemoryNamespace;
use taskherd::session::Session;
use taskherd::worker::Registrar;
use taskherd::Submitter;

#[tokio::test]
async fn test_no_master_is_reported_not_failed() {
    let ns = MemoryNamespace::new();
    let s = ns.session(Duration::from_secs(15));

    let state = admin::cluster_state(s.as_ref()).await.unwrap();
    assert!(state.master.is_none());
    assert!(state.to_string().starts_with("No master"));
}

#[tokio::test]
async fn test_full_cluster_snapshot() {
    let ns = MemoryNamespace::new();

    // One master, two workers, one task.
    let master_session = ns.session(Duration::from_secs(15));
    let elector = Elector::new(master_session as Arc<dyn Session>, "boss")
        .with_retry_delay(Duration::from_millis(5));
    assert_eq!(elector.run_for_leader().await.unwrap(), MasterState::Leader);

    for id in ["w1", "w2"] {
        let session = ns.session(Duration::from_secs(15));
        let registrar = Registrar::new(session as Arc<dyn Session>, id);
        registrar.register().await.unwrap();
        if id == "w2" {
            registrar.set_status("Busy").await.unwrap();
        }
    }

    let client = ns.session(Duration::from_secs(15));
    let task = Submitter::new(client.clone() as Arc<dyn Session>)
        .submit("echo hi")
        .await
        .unwrap();

    let state = admin::cluster_state(client.as_ref()).await.unwrap();
    let master = state.master.as_ref().unwrap();
    assert_eq!(master.server_id, "boss");

    assert_eq!(state.workers.len(), 2);
    assert_eq!(state.workers[0].name, "worker-w1");
    assert_eq!(state.workers[0].status, "Idle");
    assert_eq!(state.workers[1].name, "worker-w2");
    assert_eq!(state.workers[1].status, "Busy");

    assert_eq!(state.tasks.len(), 1);
    assert!(task.ends_with(&state.tasks[0]));

    let rendered = state.to_string();
    assert!(rendered.contains("Master: boss"));
    assert!(rendered.contains("worker-w2: Busy"));
    assert!(rendered.contains("task-0000000000"));
}

#[tokio::test]
async fn test_snapshot_after_master_loss() {
    let ns = MemoryNamespace::new();
    let master_session = ns.session(Duration::from_secs(15));
    let elector = Elector::new(master_session.clone() as Arc<dyn Session>, "boss")
        .with_retry_delay(Duration::from_millis(5));
    elector.run_for_leader().await.unwrap();

    master_session.expire();

    let observer = ns.session(Duration::from_secs(15));
    let state = admin::cluster_state(observer.as_ref()).await.unwrap();
    assert!(state.master.is_none());
    // Structure survives the master; the queue is still listable.
    assert!(state.tasks.is_empty());
    assert!(state.to_string().contains("No master"));
}
