//! Concurrent ACL writers on shared keys.

use std::sync::Arc;
use warden_auth::{AuthError, GrantKey, Stores};
use warden_runtime::{MemoryDirectory, ResourceAclStore};
use warden_types::PrincipalId;

fn acl() -> ResourceAclStore {
    ResourceAclStore::from_stores(&Stores::shared(Arc::new(MemoryDirectory::new())))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_grants_leave_one_complete_set() {
    let acl = acl();
    let key = GrantKey::new("u1", "document", "d1");

    let mut handles = Vec::new();
    for i in 0..32 {
        let acl = acl.clone();
        let key = key.clone();
        handles.push(tokio::spawn(async move {
            let actions = if i % 2 == 0 {
                vec!["read".to_string(), "update".to_string()]
            } else {
                vec!["delete".to_string()]
            };
            acl.grant(&key, actions).await
        }));
    }
    for handle in handles {
        handle.await.expect("task").expect("grant");
    }

    let grants = acl
        .list_for_principal(&PrincipalId::new("u1"), None)
        .await
        .expect("list");
    assert_eq!(grants.len(), 1);
    let actions: Vec<&str> = grants[0].actions.iter().map(String::as_str).collect();
    assert!(actions == ["read", "update"] || actions == ["delete"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn crossing_delegations_do_not_deadlock() {
    let acl = acl();
    let a = PrincipalId::new("a");
    let b = PrincipalId::new("b");
    acl.grant(&GrantKey::new(a.clone(), "document", "d1"), ["read"])
        .await
        .expect("grant a");
    acl.grant(&GrantKey::new(b.clone(), "document", "d1"), ["read"])
        .await
        .expect("grant b");

    let mut handles = Vec::new();
    for i in 0..50 {
        let acl = acl.clone();
        let (from, to) = if i % 2 == 0 {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        };
        handles.push(tokio::spawn(async move {
            acl.delegate(&from, &to, "document", "d1", ["read"]).await
        }));
    }

    let all = async {
        for handle in handles {
            handle.await.expect("task").expect("delegate");
        }
    };
    tokio::time::timeout(std::time::Duration::from_secs(10), all)
        .await
        .expect("delegations completed");

    assert!(acl.check_access(&GrantKey::new("a", "document", "d1"), "read").await);
    assert!(acl.check_access(&GrantKey::new("b", "document", "d1"), "read").await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn revoke_races_with_delegate() {
    let acl = acl();
    let owner = GrantKey::new("u1", "document", "d1");
    acl.grant(&owner, ["read"]).await.expect("grant");

    let revoker = {
        let acl = acl.clone();
        let owner = owner.clone();
        tokio::spawn(async move { acl.revoke(&owner).await })
    };
    let delegator = {
        let acl = acl.clone();
        tokio::spawn(async move {
            acl.delegate(
                &PrincipalId::new("u1"),
                &PrincipalId::new("u2"),
                "document",
                "d1",
                ["read"],
            )
            .await
        })
    };

    revoker.await.expect("task").expect("revoke");
    match delegator.await.expect("task") {
        Ok(grant) => assert!(grant.allows("read")),
        Err(AuthError::NotFound { .. }) => {}
        Err(other) => panic!("unexpected delegation error: {other}"),
    }
    assert!(!acl.check_access(&owner, "read").await);
}
