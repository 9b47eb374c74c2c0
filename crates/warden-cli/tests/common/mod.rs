//! Shared E2E test helpers for `warden` binary tests.

use assert_cmd::cargo::cargo_bin_cmd;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Default timeout for CLI tests.
pub const TIMEOUT: Duration = Duration::from_secs(10);

const WARDEN_VARS: &[&str] = &[
    "WARDEN_DEBUG",
    "WARDEN_LOG_LEVEL",
    "WARDEN_TRUST_FORWARDED_FOR",
    "WARDEN_FORWARDED_HEADER",
    "WARDEN_DENY_UNREGISTERED",
    "RUST_LOG",
];

pub const SNAPSHOT: &str = r#"{
    "roles": [
        { "id": "r-admin", "name": "admin" },
        { "id": "r-manager", "name": "manager", "parentId": "r-admin" },
        { "id": "r-viewer", "name": "viewer" }
    ],
    "permissions": [
        { "id": "p-del", "name": "policy:delete" },
        { "id": "p-read", "name": "report:read" }
    ],
    "rolePermissions": [
        { "roleId": "r-admin", "permissionId": "p-del" },
        { "roleId": "r-manager", "permissionId": "p-read" }
    ],
    "policies": [
        {
            "name": "office-hours",
            "effect": "ALLOW",
            "conditions": { "type": "time", "startTime": "09:00", "endTime": "17:00" }
        }
    ],
    "grants": [
        { "principalId": "u1", "resourceType": "document", "resourceId": "d1", "actions": ["update"] }
    ]
}"#;

pub const CONFIG: &str = r#"
[operations."policies.delete"]
permissions = ["policy:delete"]

[operations."documents.update"]
resource = { type = "document", action = "update", id = { param = "id" } }
"#;

/// A project directory holding a snapshot and `.warden/config.toml`.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::write(dir.path().join("snapshot.json"), SNAPSHOT).expect("write snapshot");
        let warden_dir = dir.path().join(".warden");
        std::fs::create_dir_all(&warden_dir).expect("create .warden");
        std::fs::write(warden_dir.join("config.toml"), CONFIG).expect("write config");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `content` to `name` inside the fixture and returns its path.
    pub fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).expect("write fixture file");
        path
    }

    pub fn snapshot(&self) -> PathBuf {
        self.dir.path().join("snapshot.json")
    }

    /// `warden` isolated from the user's home and environment, rooted at
    /// this fixture.
    pub fn cmd(&self) -> assert_cmd::Command {
        let mut cmd: assert_cmd::Command = cargo_bin_cmd!("warden");
        cmd.timeout(TIMEOUT);
        for var in WARDEN_VARS {
            cmd.env_remove(var);
        }
        cmd.env("HOME", self.path());
        cmd.args([
            "--project",
            self.path().to_str().expect("valid utf8"),
            "--config",
            self.path().join("no-global.toml").to_str().expect("valid utf8"),
        ]);
        cmd
    }
}

/// HTTP envelope for a user holding one role, with an optional `id` param.
pub fn http_request(user: &str, role_id: &str, id: Option<&str>) -> String {
    let params = id.map_or_else(String::new, |id| format!(r#", "params": {{ "id": "{id}" }}"#));
    format!(
        r#"{{ "transport": "http", "principal": {{ "id": "{user}", "roles": [ {{ "role": {{ "id": "{role_id}" }} }} ] }}{params} }}"#
    )
}
