//! Replica synchronization between two stores.
//!
//! Same shape as `storage.rs`: backend-agnostic scenarios, instantiated per
//! backend, plus a couple of mixed memory/sled runs at the end.

mod common;

use common::*;
use tessera_protocol::crypto::keys::AuthorKeypair;
use tessera_protocol::storage::{Query, Storage};
use tessera_protocol::sync::{sync, SyncDirection, SyncError, SyncOpts, SyncResults};

fn results(num_pushed: usize, num_pulled: usize) -> SyncResults {
    SyncResults {
        num_pushed,
        num_pulled,
    }
}

fn assert_same_contents(a: &dyn Storage, b: &dyn Storage) {
    assert_eq!(
        a.paths(&Query::default()).expect("paths"),
        b.paths(&Query::default()).expect("paths")
    );
    assert_eq!(
        a.documents(&Query::default()).expect("docs"),
        b.documents(&Query::default()).expect("docs")
    );
    assert_eq!(
        a.documents(&Query::history()).expect("docs"),
        b.documents(&Query::history()).expect("docs")
    );
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

fn push_to_empty_store<S: Storage>(make: impl Fn(&str) -> S) {
    let storage1 = make(WORKSPACE);
    let storage2 = make(WORKSPACE);
    let (kp1, kp2) = (keypair1(), keypair2());

    assert!(storage1.set(&kp1, doc("/decoy2", "zzz", NOW)).expect("set"));
    assert!(storage1.set(&kp1, doc("/decoy1", "aaa", NOW)).expect("set"));
    assert!(storage1.set(&kp1, doc("/path1", "one", NOW)).expect("set"));
    assert!(storage1.set(&kp2, doc("/path1", "two", NOW + 1)).expect("set"));

    let push = SyncOpts::direction(SyncDirection::Push);
    // History rows travel too.
    assert_eq!(storage1.sync(&storage2, &push).expect("sync"), results(4, 0));
    assert_same_contents(&storage1, &storage2);

    assert_eq!(
        storage2.paths(&Query::default()).expect("paths"),
        strings(&["/decoy1", "/decoy2", "/path1"])
    );
    assert_eq!(storage2.get_value("/path1").expect("get").as_deref(), Some("two"));
    assert_eq!(
        storage2.values(&Query::default()).expect("values"),
        strings(&["aaa", "zzz", "two"])
    );
    assert_eq!(
        storage2.values(&Query::history()).expect("values"),
        strings(&["aaa", "zzz", "two", "one"])
    );

    assert_eq!(storage1.sync(&storage2, &push).expect("sync"), results(0, 0));
}

fn two_way<S: Storage>(make: impl Fn(&str) -> S) {
    let explicit = SyncOpts {
        direction: SyncDirection::Both,
        existing: true,
        live: false,
    };
    for opts in [SyncOpts::default(), explicit] {
        let storage1 = make(WORKSPACE);
        let storage2 = make(WORKSPACE);
        let (kp1, kp2) = (keypair1(), keypair2());
        let set = |s: &S, kp: &AuthorKeypair, path: &str, value: &str, ts: i64| {
            assert!(s.set(kp, doc(path, value, ts)).expect("set"), "set {path}");
        };

        set(&storage1, &kp1, "/decoy2", "zzz", NOW); // push
        set(&storage1, &kp1, "/decoy1", "aaa", NOW); // push
        set(&storage1, &kp1, "/path1", "one", NOW); // push, history
        set(&storage1, &kp2, "/path1", "two", NOW + 1); // push

        set(&storage2, &kp1, "/latestOnStorage1", "221", NOW); // dropped
        set(&storage1, &kp1, "/latestOnStorage1", "111", NOW + 10); // push

        set(&storage1, &kp1, "/latestOnStorage2", "11", NOW); // dropped
        set(&storage2, &kp1, "/latestOnStorage2", "22", NOW + 10); // pull

        set(&storage1, &kp1, "/authorConflict", "author1storage1", NOW); // push, history
        set(&storage2, &kp2, "/authorConflict", "author2storage2", NOW + 1); // pull

        assert_eq!(storage1.sync(&storage2, &opts).expect("sync"), results(6, 2));

        assert_eq!(storage1.paths(&Query::default()).expect("paths").len(), 6);
        assert_eq!(storage1.documents(&Query::default()).expect("docs").len(), 6);
        assert_eq!(storage1.documents(&Query::history()).expect("docs").len(), 8);
        assert_eq!(
            storage1.paths(&Query::default()).expect("paths"),
            strings(&[
                "/authorConflict",
                "/decoy1",
                "/decoy2",
                "/latestOnStorage1",
                "/latestOnStorage2",
                "/path1",
            ])
        );
        assert_eq!(
            storage1.values(&Query::default()).expect("values"),
            strings(&["author2storage2", "aaa", "zzz", "111", "22", "two"])
        );
        assert_same_contents(&storage1, &storage2);

        assert_eq!(storage1.sync(&storage2, &opts).expect("sync"), results(0, 0));
    }
}

fn mismatched_workspaces<S: Storage>(make: impl Fn(&str) -> S) {
    let a1 = make(WORKSPACE);
    let a2 = make(WORKSPACE);
    let b = make(WORKSPACE2);
    let kp1 = keypair1();
    assert!(a1.set(&kp1, doc("/a1", "a1", NOW)).expect("set"));
    assert!(a2.set(&kp1, doc("/a2", "a2", NOW)).expect("set"));
    assert!(b.set(&kp1, doc("/b", "b", NOW)).expect("set"));

    let opts = SyncOpts::default();
    assert_eq!(a1.sync(&b, &opts).expect("sync"), results(0, 0));
    assert_eq!(a1.get_value("/b").expect("get"), None);
    assert_eq!(b.get_value("/a1").expect("get"), None);
    assert_eq!(b.paths(&Query::history()).expect("paths"), strings(&["/b"]));
    assert_eq!(b.sync(&a1, &opts).expect("sync"), results(0, 0));
    assert_eq!(a1.paths(&Query::history()).expect("paths"), strings(&["/a1"]));
    assert_eq!(a1.sync(&a2, &opts).expect("sync"), results(1, 1));
}

fn misc_options<S: Storage>(make: impl Fn(&str) -> S) {
    let empty1 = make(WORKSPACE);
    let empty2 = make(WORKSPACE);
    let storage = make(WORKSPACE);
    let kp1 = keypair1();

    // No timestamp: the store picks the current time.
    assert!(storage
        .set(&kp1, tessera_protocol::DocToSet::new(FORMAT, "/foo", "bar"))
        .expect("set"));

    let live = SyncOpts {
        live: true,
        ..SyncOpts::default()
    };
    assert!(matches!(
        empty1.sync(&empty2, &live),
        Err(SyncError::LiveNotImplemented)
    ));

    let no_existing = SyncOpts {
        existing: false,
        ..SyncOpts::default()
    };
    for opts in [
        SyncOpts::default(),
        SyncOpts::direction(SyncDirection::Push),
        SyncOpts::direction(SyncDirection::Pull),
        SyncOpts::direction(SyncDirection::Both),
        no_existing.clone(),
    ] {
        assert_eq!(empty1.sync(&empty2, &opts).expect("sync"), results(0, 0));
    }

    let pull = SyncOpts::direction(SyncDirection::Pull);
    let push = SyncOpts::direction(SyncDirection::Push);
    assert_eq!(storage.sync(&empty1, &pull).expect("sync"), results(0, 0));
    assert_eq!(empty1.sync(&storage, &push).expect("sync"), results(0, 0));

    assert_eq!(storage.sync(&storage, &SyncOpts::default()).expect("sync"), results(0, 0));

    assert_eq!(storage.sync(&empty1, &no_existing).expect("sync"), results(0, 0));
    assert_eq!(empty1.sync(&storage, &no_existing).expect("sync"), results(0, 0));

    assert_eq!(storage.sync(&empty1, &SyncOpts::default()).expect("sync"), results(1, 0));
    assert_eq!(empty2.sync(&storage, &SyncOpts::default()).expect("sync"), results(0, 1));
}

macro_rules! backend_tests {
    ($backend:ident, $make:expr) => {
        mod $backend {
            use super::*;

            #[test]
            fn push_to_empty_store() {
                super::push_to_empty_store($make);
            }

            #[test]
            fn two_way() {
                super::two_way($make);
            }

            #[test]
            fn mismatched_workspaces() {
                super::mismatched_workspaces($make);
            }

            #[test]
            fn misc_options() {
                super::misc_options($make);
            }
        }
    };
}

backend_tests!(memory_backend, memory);
backend_tests!(sled_backend, sled_temp);

// ---------------------------------------------------------------------------
// Mixed backends
// ---------------------------------------------------------------------------

#[test]
fn memory_and_sled_converge() {
    let mem = memory(WORKSPACE);
    let disk = sled_temp(WORKSPACE);
    let (kp1, kp2, kp3) = (keypair1(), keypair2(), keypair3());

    assert!(mem.set(&kp1, doc("/wiki/gnome", "short", NOW)).expect("set"));
    assert!(disk.set(&kp2, doc("/wiki/gnome", "tall", NOW + 5)).expect("set"));
    assert!(disk.set(&kp3, doc("/chat/hi", "hello", NOW + 1)).expect("set"));
    assert!(mem.set(&kp3, doc("/chat/hi", "hello again", NOW + 2)).expect("set"));

    let first = sync(&mem, &disk, &SyncOpts::default()).expect("sync");
    // The stale /chat/hi row on disk is refused by memory.
    assert_eq!(first, results(2, 1));
    assert_same_contents(&mem, &disk);
    assert_eq!(mem.get_value("/wiki/gnome").expect("get").as_deref(), Some("tall"));
    assert_eq!(disk.get_value("/chat/hi").expect("get").as_deref(), Some("hello again"));

    assert_eq!(sync(&disk, &mem, &SyncOpts::default()).expect("sync"), results(0, 0));
}

#[test]
fn three_replicas_converge_in_any_order() {
    let stores = [memory(WORKSPACE), memory(WORKSPACE), memory(WORKSPACE)];
    let kps = [keypair1(), keypair2(), keypair3()];
    for (i, (store, kp)) in stores.iter().zip(&kps).enumerate() {
        let ts = NOW + i as i64;
        assert!(store.set(kp, doc("/shared", &format!("from {i}"), ts)).expect("set"));
        assert!(store.set(kp, doc(&format!("/own/{i}"), "mine", ts)).expect("set"));
    }

    let opts = SyncOpts::default();
    sync(&stores[2], &stores[0], &opts).expect("sync");
    sync(&stores[0], &stores[1], &opts).expect("sync");
    sync(&stores[1], &stores[2], &opts).expect("sync");

    for store in &stores[1..] {
        assert_same_contents(&stores[0], store);
    }
    assert_eq!(
        stores[0].get_value("/shared").expect("get").as_deref(),
        Some("from 2")
    );
    assert_eq!(stores[0].documents(&Query::history()).expect("docs").len(), 6);
}
