//! Warden CLI - offline access decisions.
//!
//! Loads a directory snapshot (roles, permissions, policies, grants) and
//! answers access questions against it.
//!
//! # Configuration
//!
//! Configuration is loaded from multiple sources with priority:
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`WARDEN_*`)
//! 3. Project config (`.warden/config.toml` in the project directory)
//! 4. Global config (`~/.warden/config.toml`, or `--config`)
//! 5. Default values (lowest priority)
//!
//! # Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | permit, or command succeeded |
//! | 1 | error (bad input, malformed data, role cycle) |
//! | 2 | deny |

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use warden_runtime::config::{ConfigLoader, ConfigResolver, WardenConfig};

/// Warden - access decisions against a directory snapshot
#[derive(Parser, Debug)]
#[command(name = "warden")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Project root directory (defaults to current directory)
    #[arg(short = 'C', long, global = true)]
    project: Option<PathBuf>,

    /// Global config file (defaults to ~/.warden/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Trust this forwarded-for header for the source address
    #[arg(long, global = true, value_name = "HEADER")]
    trust_forwarded_header: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decide a request against an operation or a requirement file
    Check {
        /// Directory snapshot (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Transport request envelope (JSON)
        #[arg(short, long)]
        request: PathBuf,

        /// Operation id from the `[operations]` config section
        #[arg(short, long, conflicts_with = "requirement", required_unless_present = "requirement")]
        operation: Option<String>,

        /// Requirement file (JSON)
        #[arg(long)]
        requirement: Option<PathBuf>,

        /// Evaluate at this instant (RFC 3339) instead of now
        #[arg(long, value_name = "TIME")]
        at: Option<String>,

        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// List a role's effective permissions
    Effective {
        /// Directory snapshot (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Role id
        #[arg(short, long)]
        role: String,
    },

    /// Print the role hierarchy below a role
    Tree {
        /// Directory snapshot (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Role id
        #[arg(short, long)]
        role: String,
    },

    /// Print the resolved configuration as TOML
    Config,
}

/// Applies CLI flags as the highest-priority configuration layer.
struct CliOverrides {
    debug: bool,
    trust_forwarded_header: Option<String>,
}

impl CliOverrides {
    fn from_args(args: &Args) -> Self {
        Self {
            debug: args.debug,
            trust_forwarded_header: args.trust_forwarded_header.clone(),
        }
    }
}

impl ConfigResolver for CliOverrides {
    fn apply(&self, config: &mut WardenConfig) {
        if self.debug {
            config.debug = true;
        }
        if let Some(ref header) = self.trust_forwarded_header {
            config.context.trust_forwarded_for = true;
            config.context.forwarded_header = header.to_ascii_lowercase();
        }
    }
}

fn load_config(args: &Args) -> anyhow::Result<WardenConfig> {
    let project_root = args.project.clone().unwrap_or_else(|| {
        std::env::current_dir().unwrap_or_else(|e| {
            eprintln!("warning: failed to get current directory, using '.': {e}");
            PathBuf::from(".")
        })
    });

    let mut loader = ConfigLoader::new().with_project_root(project_root);
    if let Some(ref path) = args.config {
        loader = loader.with_global_config(path);
    }

    let mut config = loader
        .load()
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;
    CliOverrides::from_args(args).apply(&mut config);
    Ok(config)
}

/// Filter precedence: `--debug` / `debug = true` > `RUST_LOG` > `logging.level`.
fn init_tracing(config: &WardenConfig) {
    let filter = if config.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    };

    let layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::from(1);
        }
    };

    init_tracing(&config);

    match commands::run(args.command, &config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}
