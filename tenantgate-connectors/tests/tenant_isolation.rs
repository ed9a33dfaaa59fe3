//! End-to-end isolation checks through the requester facades.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tempfile::{tempdir, TempDir};
use tenantgate_acl::{authorize, Acl};
use tenantgate_connectors::{
    AclConfig, CacheConnector, ConnectorError, ConsoleLog, LocalStorage, LogConnector, LogEntry,
    RamCache, Requester, SecureConnector, StorageConnector, StorageMetadata,
};
use tenantgate_types::{AccessCandidate, AccessLevel, Role};

fn local_storage() -> (TempDir, Arc<dyn StorageConnector>) {
    let dir = tempdir().unwrap();
    let storage: Arc<dyn StorageConnector> =
        Arc::new(LocalStorage::new(dir.path(), AclConfig::default()));
    (dir, storage)
}

#[tokio::test]
async fn test_users_cannot_touch_each_others_objects() {
    let (_dir, storage) = local_storage();

    storage.user("alice").write("diary.md", "dear diary").await.unwrap();

    let bob = storage.user("bob");
    assert!(bob.read("diary.md").await.unwrap_err().is_access_denied());
    assert!(bob.write("diary.md", "overwritten").await.unwrap_err().is_access_denied());
    assert!(bob.delete("diary.md").await.unwrap_err().is_access_denied());

    // Same id under another role is a different principal
    assert!(storage
        .agent("alice")
        .read("diary.md")
        .await
        .unwrap_err()
        .is_access_denied());

    let alice = storage.user("alice");
    assert_eq!(alice.read("diary.md").await.unwrap(), Some(b"dear diary".to_vec()));
    assert!(alice.exists("diary.md").await.unwrap());
}

#[tokio::test]
async fn test_self_made_grants_do_not_reach_the_backend() {
    let (_dir, storage) = local_storage();
    storage.user("alice").write("diary.md", "alice secret").await.unwrap();

    let bob = AccessCandidate::user("bob");
    let mut forged = Acl::new();
    forged.add_access(Role::User, "bob", &[AccessLevel::Read, AccessLevel::Write]);

    let read = authorize(&bob.read_request("diary.md"), forged.clone()).unwrap();
    assert!(storage.read(&read).await.unwrap_err().is_access_denied());

    let write = authorize(&bob.write_request("diary.md"), forged).unwrap();
    assert!(storage
        .write(&write, b"bob was here".to_vec(), None)
        .await
        .unwrap_err()
        .is_access_denied());
    assert!(storage.delete(&write).await.unwrap_err().is_access_denied());

    assert_eq!(
        storage.user("alice").read("diary.md").await.unwrap(),
        Some(b"alice secret".to_vec())
    );
}

#[tokio::test]
async fn test_grants_do_not_cross_connectors() {
    let (_dir, storage) = local_storage();
    storage.user("alice").write("report", "q3 numbers").await.unwrap();

    // bob creates "report" in the cache, so the cache grants him ownership
    let cache = RamCache::new(AclConfig::default());
    let bob = AccessCandidate::user("bob");
    let grant = cache.enforce(&bob.read_request("report")).await.unwrap();
    assert!(storage.read(&grant).await.unwrap_err().is_access_denied());
}

#[tokio::test]
async fn test_denial_message_has_no_detail() {
    let (_dir, storage) = local_storage();
    storage.user("alice").write("x", "1").await.unwrap();

    let err = storage.user("bob").read("x").await.unwrap_err();
    assert!(matches!(err, ConnectorError::AccessDenied(_)));
    assert_eq!(err.to_string(), "Access Denied");
}

#[tokio::test]
async fn test_team_uri_grants_team_read() {
    let (_dir, storage) = local_storage();
    let uri = "smyth://acme.team/scout/report.md";

    storage.agent("scout").write(uri, "findings").await.unwrap();

    let acme = storage.team("acme");
    assert_eq!(acme.read(uri).await.unwrap(), Some(b"findings".to_vec()));
    assert!(acme.write(uri, "edited").await.unwrap_err().is_access_denied());
    assert!(storage
        .team("globex")
        .read(uri)
        .await
        .unwrap_err()
        .is_access_denied());
}

#[tokio::test]
async fn test_requester_team_applies_to_plain_ids() {
    let (_dir, storage) = local_storage();

    storage
        .user("alice")
        .in_team("t1")
        .write("shared.txt", "hi")
        .await
        .unwrap();

    assert!(storage.team("t1").read("shared.txt").await.is_ok());
    assert!(storage.team("t2").read("shared.txt").await.is_err());
}

#[tokio::test]
async fn test_owner_can_share_and_others_cannot_reshare() {
    let (_dir, storage) = local_storage();
    let alice = storage.user("alice");
    alice.write("plan.md", "v1").await.unwrap();

    let mut acl = alice.get_acl("plan.md").await.unwrap();
    acl.add_access(Role::User, "bob", &[AccessLevel::Read]);
    alice.set_acl("plan.md", acl).await.unwrap();

    let bob = storage.user("bob");
    assert_eq!(bob.read("plan.md").await.unwrap(), Some(b"v1".to_vec()));
    assert!(bob.write("plan.md", "v2").await.unwrap_err().is_access_denied());

    let bob_view = bob.get_acl("plan.md").await.unwrap();
    assert!(bob
        .set_acl("plan.md", bob_view)
        .await
        .unwrap_err()
        .is_access_denied());
}

#[tokio::test]
async fn test_public_read() {
    let (_dir, storage) = local_storage();
    let alice = storage.user("alice");
    alice.write("index.html", "<h1>hi</h1>").await.unwrap();

    let public = storage.requester(AccessCandidate::public());
    assert!(public.read("index.html").await.is_err());

    let mut acl = alice.get_acl("index.html").await.unwrap();
    acl.add_public_access(&[AccessLevel::Read]);
    alice.set_acl("index.html", acl).await.unwrap();

    assert!(public.read("index.html").await.is_ok());
    assert!(public.write("index.html", "defaced").await.is_err());
}

#[tokio::test]
async fn test_metadata_round_trip() {
    let (_dir, storage) = local_storage();
    let alice = storage.user("alice");

    let mut metadata = StorageMetadata::new();
    metadata.insert("content_type".into(), serde_json::json!("text/markdown"));
    alice
        .write_with_metadata("doc.md", "# doc", Some(metadata.clone()))
        .await
        .unwrap();
    assert_eq!(alice.get_metadata("doc.md").await.unwrap(), Some(metadata));

    let mut updated = StorageMetadata::new();
    updated.insert("pinned".into(), serde_json::json!(true));
    alice.set_metadata("doc.md", updated.clone()).await.unwrap();
    assert_eq!(alice.get_metadata("doc.md").await.unwrap(), Some(updated));

    // Writing data alone keeps the metadata and the ACL
    alice.write("doc.md", "# doc v2").await.unwrap();
    assert!(alice.get_metadata("doc.md").await.unwrap().is_some());
    assert!(storage.user("bob").get_metadata("doc.md").await.is_err());
}

#[tokio::test]
async fn test_delete_then_recreate_by_someone_else() {
    let (_dir, storage) = local_storage();
    storage.user("alice").write("tmp", "a").await.unwrap();
    storage.user("alice").delete("tmp").await.unwrap();
    assert!(!storage.user("alice").exists("tmp").await.unwrap());

    storage.user("bob").write("tmp", "b").await.unwrap();
    assert!(storage.user("alice").read("tmp").await.is_err());
}

#[tokio::test]
async fn test_legacy_sidecar_is_migrated() {
    let (dir, storage) = local_storage();
    fs::create_dir_all(dir.path().join("data")).unwrap();
    fs::create_dir_all(dir.path().join("meta")).unwrap();
    fs::write(dir.path().join("data/old.txt"), "legacy bytes").unwrap();
    fs::write(
        dir.path().join("meta/old.txt.json"),
        r#"{"metadata": {}, "owner": {"role": "user", "id": "u1"}, "team": "t1"}"#,
    )
    .unwrap();

    let owner = storage.user("u1");
    let acl = owner.get_acl("old.txt").await.unwrap();
    assert!(acl.is_migrated());
    assert_eq!(owner.read("old.txt").await.unwrap(), Some(b"legacy bytes".to_vec()));
    assert!(storage.team("t1").read("old.txt").await.is_ok());
    assert!(storage.user("u2").read("old.txt").await.is_err());

    // The synthesized ACL is persisted on the next write
    owner.write("old.txt", "fresh bytes").await.unwrap();
    let sidecar = fs::read_to_string(dir.path().join("meta/old.txt.json")).unwrap();
    assert!(sidecar.contains("m:1"), "{}", sidecar);
    assert!(owner.get_acl("old.txt").await.unwrap().is_migrated());
}

#[tokio::test]
async fn test_orphaned_object_is_locked() {
    let (dir, storage) = local_storage();
    fs::create_dir_all(dir.path().join("data")).unwrap();
    fs::write(dir.path().join("data/orphan.bin"), [0u8, 1, 2]).unwrap();

    for candidate in [
        AccessCandidate::user("anyone"),
        AccessCandidate::team("t1"),
        AccessCandidate::agent("a1"),
    ] {
        let requester = storage.requester(candidate);
        assert!(requester.read("orphan.bin").await.unwrap_err().is_access_denied());
        assert!(requester.write("orphan.bin", "mine").await.unwrap_err().is_access_denied());
    }
}

#[tokio::test]
async fn test_cache_isolation_and_ttl() {
    let cache: Arc<dyn CacheConnector> = Arc::new(RamCache::new(AclConfig::default()));

    let alice = cache.user("alice");
    alice
        .set("session", "token-123", Some(Duration::from_secs(60)))
        .await
        .unwrap();
    assert_eq!(alice.get("session").await.unwrap().as_deref(), Some("token-123"));

    let bob = cache.user("bob");
    assert!(bob.get("session").await.unwrap_err().is_access_denied());
    assert!(bob.set("session", "stolen", None).await.unwrap_err().is_access_denied());
    assert!(bob
        .update_ttl("session", Duration::from_secs(1))
        .await
        .unwrap_err()
        .is_access_denied());

    alice.update_ttl("session", Duration::from_secs(600)).await.unwrap();
    let ttl = alice.get_ttl("session").await.unwrap().unwrap();
    assert!(ttl > Duration::from_secs(60));

    alice.delete("session").await.unwrap();
    assert!(!alice.exists("session").await.unwrap());
}

#[tokio::test]
async fn test_log_is_agent_only() {
    let log: Arc<dyn LogConnector> = Arc::new(ConsoleLog::new(AclConfig::default()));

    let err = log
        .requester(AccessCandidate::user("u1"))
        .err()
        .expect("users are rejected");
    assert!(matches!(err, ConnectorError::RoleNotAllowed(_)));
    assert_eq!(err.to_string(), "Only agents can use Log connector");
    assert!(log.requester(AccessCandidate::team("t1")).is_err());

    let scout = log.agent("scout");
    scout
        .log(LogEntry::new("planner", "started").with_data(serde_json::json!({"step": 1})))
        .await
        .unwrap();
    scout.log(LogEntry::new("planner", "finished")).await.unwrap();

    let entries = scout.entries(10).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].message, "finished");

    // Another agent only sees its own stream
    assert!(log.agent("other").entries(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_log_rejects_hand_built_user_requesters() {
    let log: Arc<dyn LogConnector> = Arc::new(ConsoleLog::new(AclConfig::default()));

    let user = Requester::new(&*log, AccessCandidate::user("u1"));
    let err = user.log(LogEntry::new("s", "sneaky")).await.unwrap_err();
    assert!(matches!(err, ConnectorError::RoleNotAllowed(_)));
    assert!(user.entries(10).await.is_err());

    // Nothing was written under the user's id
    let grant = log
        .enforce(&AccessCandidate::agent("u1").read_request("u1"))
        .await
        .unwrap();
    assert!(log.entries(&grant, 10).await.unwrap().is_empty());
}
