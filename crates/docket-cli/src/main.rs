//! `docket`: command-line client for the docket review server.
//!
//! # Usage
//!
//! ```
//! docket --url http://localhost:8080 --token s3cret review
//! docket --config ~/.config/docket/config.toml export <decision-id>
//! ```

mod client;
mod render;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, NewDecisionBody};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "docket", about = "Command-line client for the docket review server")]
struct Args {
  /// Path to a TOML config file (url, token).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the docket server (default: http://localhost:8080).
  #[arg(long, env = "DOCKET_URL")]
  url: Option<String>,

  /// Bearer token matching the server's export secret.
  #[arg(long, env = "DOCKET_TOKEN")]
  token: Option<String>,

  /// Print raw JSON instead of tables.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show the current review snapshot.
  Review,
  /// Export one review candidate (recorded in the audit log).
  Export { id: Uuid },
  /// Trigger the review webhook for one candidate (recorded in the audit log).
  Webhook { id: Uuid },
  /// List all decisions with their derived status.
  Decisions,
  /// Record a new decision.
  Create {
    title:      String,
    #[arg(long)]
    area:       String,
    #[arg(long, default_value = "MEDIUM")]
    impact:     String,
    /// RFC 3339 timestamp; defaults to now on the server.
    #[arg(long)]
    decided_at: Option<DateTime<Utc>>,
  },
  /// Capture a snapshot of a decision.
  Snapshot {
    id:   Uuid,
    #[arg(long)]
    note: Option<String>,
  },
  /// Lock a decision's latest snapshot.
  Lock { id: Uuid },
  /// Archive a decision.
  Archive { id: Uuid },
  /// Show the audit trail, for one decision or the whole log.
  Audit { id: Option<Uuid> },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:   String,
  #[serde(default)]
  token: String,
}

fn non_empty(s: &str) -> Option<String> { (!s.is_empty()).then(|| s.to_string()) }

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| non_empty(&file_cfg.url))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    token:    args
      .token
      .or_else(|| non_empty(&file_cfg.token))
      .unwrap_or_default(),
  };

  let client = ApiClient::new(api_config)?;
  run(&client, args.command, args.json).await
}

async fn run(client: &ApiClient, command: Command, json: bool) -> Result<()> {
  match command {
    Command::Review => {
      let snap = client.review().await?;
      emit(&snap, json, render::review)
    }
    Command::Export { id } => {
      let export = client.export(id).await?;
      // Exports are meant for piping; always JSON.
      emit(&export, true, |_| String::new())
    }
    Command::Webhook { id } => {
      let delivery = client.webhook(id).await?;
      emit(&delivery, json, |d| {
        format!("webhook for {} delivered at {}\n", d.review_id, d.delivered_at.to_rfc3339())
      })
    }
    Command::Decisions => {
      let list = client.list_decisions().await?;
      emit(&list, json, |l| render::decisions(l))
    }
    Command::Create { title, area, impact, decided_at } => {
      let body = NewDecisionBody { title, area, impact, decided_at };
      let created = client.create_decision(&body).await?;
      emit(&created, json, |r| render::decisions(std::slice::from_ref(r)))
    }
    Command::Snapshot { id, note } => {
      let updated = client.snapshot(id, note).await?;
      emit(&updated, json, |r| render::decisions(std::slice::from_ref(r)))
    }
    Command::Lock { id } => {
      let updated = client.lock(id).await?;
      emit(&updated, json, |r| render::decisions(std::slice::from_ref(r)))
    }
    Command::Archive { id } => {
      let updated = client.archive(id).await?;
      emit(&updated, json, |r| render::decisions(std::slice::from_ref(r)))
    }
    Command::Audit { id } => {
      let events = client.audit(id).await?;
      emit(&events, json, |e| render::audit(e))
    }
  }
}

fn emit<T: Serialize>(value: &T, json: bool, text: impl FnOnce(&T) -> String) -> Result<()> {
  if json {
    println!("{}", serde_json::to_string_pretty(value)?);
  } else {
    print!("{}", text(value));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory;

  use super::*;

  #[test]
  fn cli_definition_is_consistent() { Args::command().debug_assert(); }

  #[test]
  fn create_parses_flags() {
    let args = Args::try_parse_from([
      "docket",
      "--token",
      "t",
      "create",
      "Move to quarterly planning",
      "--area",
      "PRODUCT",
      "--impact",
      "HIGH",
      "--decided-at",
      "2025-01-01T00:00:00Z",
    ])
    .unwrap();
    match args.command {
      Command::Create { title, area, impact, decided_at } => {
        assert_eq!(title, "Move to quarterly planning");
        assert_eq!(area, "PRODUCT");
        assert_eq!(impact, "HIGH");
        assert!(decided_at.is_some());
      }
      other => panic!("unexpected command {other:?}"),
    }
  }

  #[test]
  fn audit_id_is_optional() {
    let args = Args::try_parse_from(["docket", "audit"]).unwrap();
    assert!(matches!(args.command, Command::Audit { id: None }));
  }
}
