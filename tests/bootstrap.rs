//! Bootstrap idempotency across racing masters

use std::time::Duration;
use taskherd::common::STRUCTURE_PATHS;
use taskherd::master::ensure_structure;
use taskherd::session::memory::MemoryNamespace;
use taskherd::session::Session;

const RETRY: Duration = Duration::from_millis(5);

#[tokio::test]
async fn test_two_masters_bootstrap_concurrently() {
    let ns = MemoryNamespace::new();
    let a = ns.session(Duration::from_secs(15));
    let b = ns.session(Duration::from_secs(15));

    // Two "masters" across history racing to bootstrap must be
    // indistinguishable from one.
    let ra = tokio::spawn(async move { ensure_structure(a.as_ref(), RETRY).await });
    let rb = tokio::spawn(async move { ensure_structure(b.as_ref(), RETRY).await });
    ra.await.unwrap().unwrap();
    rb.await.unwrap().unwrap();

    let probe = ns.session(Duration::from_secs(15));
    for path in STRUCTURE_PATHS {
        let (payload, stat) = probe.read(path).await.unwrap();
        assert!(payload.is_empty());
        // Never recreated or rewritten by the second run.
        assert_eq!(stat.version, 0, "{} was touched twice", path);
    }
}

#[tokio::test]
async fn test_sequential_double_bootstrap_is_silent() {
    let ns = MemoryNamespace::new();
    let s = ns.session(Duration::from_secs(15));
    ensure_structure(s.as_ref(), RETRY).await.unwrap();
    ensure_structure(s.as_ref(), RETRY).await.unwrap();

    for path in STRUCTURE_PATHS {
        assert!(s.read(path).await.is_ok());
    }
}
