//! Subcommand handlers.

use crate::Command;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use serde_json::Value;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use warden_auth::{Decision, DenyReason, Stores, TransportRequest};
use warden_runtime::config::WardenConfig;
use warden_runtime::{AccessDecisionCoordinator, MemoryDirectory, RequirementTable, RoleHierarchyResolver};
use warden_types::RoleId;

const EXIT_DENY: u8 = 2;

pub(crate) async fn run(command: Command, config: &WardenConfig) -> Result<ExitCode> {
    match command {
        Command::Check {
            snapshot,
            request,
            operation,
            requirement,
            at,
            json,
        } => {
            let stores = open(&snapshot)?;
            let coordinator =
                AccessDecisionCoordinator::from_config(&stores, config, RequirementTable::new());
            let request: TransportRequest = read_json(&request, "request")?;
            let requirement = match (operation, requirement) {
                (Some(op), _) => match coordinator.requirement_for(&op) {
                    Some(req) => req,
                    None => return Ok(report(&Decision::Deny(DenyReason::Forbidden), json)),
                },
                (None, Some(path)) => read_json(&path, "requirement")?,
                (None, None) => bail!("either --operation or --requirement is required"),
            };
            let now = match at {
                Some(at) => parse_instant(&at)?,
                None => Local::now(),
            };

            let ctx = coordinator.extractor().extract_at(&request, now);
            let decision = coordinator
                .try_decide_context(&ctx, &requirement)
                .await
                .context("access decision failed")?;
            Ok(report(&decision, json))
        }
        Command::Effective { snapshot, role } => {
            let stores = open(&snapshot)?;
            let permissions = RoleHierarchyResolver::from_stores(&stores)
                .resolve_effective_permissions(&RoleId::new(role))
                .await?;
            for permission in permissions {
                println!("{permission}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Tree { snapshot, role } => {
            let stores = open(&snapshot)?;
            let tree = RoleHierarchyResolver::from_stores(&stores)
                .hierarchy(&RoleId::new(role))
                .await?;
            print!("{}", tree.render());
            Ok(ExitCode::SUCCESS)
        }
        Command::Config => {
            print!("{}", config.to_toml()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn open(path: &Path) -> Result<Stores> {
    let directory = MemoryDirectory::load(path)?;
    Ok(Stores::shared(Arc::new(directory)))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} file '{}'", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {what} file '{}'", path.display()))
}

fn parse_instant(at: &str) -> Result<DateTime<Local>> {
    let parsed = DateTime::parse_from_rfc3339(at)
        .with_context(|| format!("invalid --at value '{at}', expected RFC 3339"))?;
    Ok(parsed.with_timezone(&Local))
}

fn report(decision: &Decision, json: bool) -> ExitCode {
    if json {
        let mut out = serde_json::Map::new();
        match decision {
            Decision::Permit => {
                out.insert("decision".into(), Value::from("permit"));
            }
            Decision::Deny(reason) => {
                out.insert("decision".into(), Value::from("deny"));
                if let Ok(Value::Object(fields)) = serde_json::to_value(reason) {
                    out.extend(fields);
                }
            }
        }
        println!("{}", Value::Object(out));
    } else {
        println!("{decision}");
    }

    if decision.is_permit() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_DENY)
    }
}
