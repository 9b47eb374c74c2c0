//! E2E tests for `warden check`.

mod common;

use common::{http_request, Fixture};
use predicates::prelude::*;

#[test]
fn manager_may_delete_policies() {
    let fx = Fixture::new();
    let request = fx.file("req.json", &http_request("u1", "r-manager", None));
    fx.cmd()
        .args(["check", "--snapshot"])
        .arg(fx.snapshot())
        .arg("--request")
        .arg(&request)
        .args(["--operation", "policies.delete"])
        .assert()
        .success()
        .stdout("permit\n");
}

#[test]
fn viewer_is_forbidden() {
    let fx = Fixture::new();
    let request = fx.file("req.json", &http_request("u2", "r-viewer", None));
    fx.cmd()
        .args(["check", "--snapshot"])
        .arg(fx.snapshot())
        .arg("--request")
        .arg(&request)
        .args(["--operation", "policies.delete"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("deny"));
}

#[test]
fn anonymous_json_output() {
    let fx = Fixture::new();
    let request = fx.file("req.json", r#"{ "transport": "http" }"#);
    fx.cmd()
        .args(["check", "--json", "--snapshot"])
        .arg(fx.snapshot())
        .arg("--request")
        .arg(&request)
        .args(["--operation", "policies.delete"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains(r#""decision":"deny""#))
        .stdout(predicate::str::contains(r#""reason":"unauthenticated""#));
}

#[test]
fn unregistered_operation_is_denied() {
    let fx = Fixture::new();
    let request = fx.file("req.json", &http_request("u1", "r-manager", None));
    fx.cmd()
        .args(["check", "--snapshot"])
        .arg(fx.snapshot())
        .arg("--request")
        .arg(&request)
        .args(["--operation", "nope"])
        .assert()
        .code(2);
}

#[test]
fn unregistered_operation_allowed_by_env() {
    let fx = Fixture::new();
    let request = fx.file("req.json", &http_request("u1", "r-manager", None));
    fx.cmd()
        .env("WARDEN_DENY_UNREGISTERED", "false")
        .args(["check", "--snapshot"])
        .arg(fx.snapshot())
        .arg("--request")
        .arg(&request)
        .args(["--operation", "nope"])
        .assert()
        .success();
}

#[test]
fn resource_grant_from_param() {
    let fx = Fixture::new();
    let granted = fx.file("granted.json", &http_request("u1", "r-manager", Some("d1")));
    let other = fx.file("other.json", &http_request("u1", "r-manager", Some("d2")));

    fx.cmd()
        .args(["check", "--snapshot"])
        .arg(fx.snapshot())
        .arg("--request")
        .arg(&granted)
        .args(["--operation", "documents.update"])
        .assert()
        .success();

    fx.cmd()
        .args(["check", "--json", "--snapshot"])
        .arg(fx.snapshot())
        .arg("--request")
        .arg(&other)
        .args(["--operation", "documents.update"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("resource_access_denied"));
}

#[test]
fn policy_requirement_file_with_fixed_instant() {
    let fx = Fixture::new();
    let request = fx.file("req.json", &http_request("u1", "r-manager", None));
    let requirement = fx.file("requirement.json", r#"{ "policies": ["office-hours"] }"#);

    // Local wall-clock time of the instant depends on the host zone, so
    // only check that the decision is one of the two valid outcomes.
    let output = fx
        .cmd()
        .args(["check", "--snapshot"])
        .arg(fx.snapshot())
        .arg("--request")
        .arg(&request)
        .arg("--requirement")
        .arg(&requirement)
        .args(["--at", "2025-01-15T12:00:00+00:00"])
        .output()
        .expect("run warden");
    let code = output.status.code();
    assert!(code == Some(0) || code == Some(2), "unexpected exit code {code:?}");
}

#[test]
fn invalid_instant_is_an_error() {
    let fx = Fixture::new();
    let request = fx.file("req.json", &http_request("u1", "r-manager", None));
    fx.cmd()
        .args(["check", "--snapshot"])
        .arg(fx.snapshot())
        .arg("--request")
        .arg(&request)
        .args(["--operation", "policies.delete", "--at", "noon"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("RFC 3339"));
}

#[test]
fn missing_snapshot_is_an_error() {
    let fx = Fixture::new();
    let request = fx.file("req.json", &http_request("u1", "r-manager", None));
    fx.cmd()
        .args(["check", "--snapshot", "/nonexistent/snapshot.json", "--request"])
        .arg(&request)
        .args(["--operation", "policies.delete"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read snapshot"));
}

#[test]
fn role_cycle_is_an_error() {
    let fx = Fixture::new();
    let cyclic = fx.file(
        "cyclic.json",
        r#"{
            "roles": [
                { "id": "a", "name": "a", "parentId": "b" },
                { "id": "b", "name": "b", "parentId": "a" }
            ]
        }"#,
    );
    let request = fx.file("req.json", &http_request("u1", "a", None));
    fx.cmd()
        .args(["check", "--snapshot"])
        .arg(&cyclic)
        .arg("--request")
        .arg(&request)
        .args(["--operation", "policies.delete"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cycle"));
}
