//! Async HTTP client wrapping the docket JSON API.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use docket_core::{
  audit::AuditEvent,
  lifecycle::ResolvedDecision,
  snapshot::{ReviewCandidate, ReviewSnapshot},
};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use uuid::Uuid;

/// Connection settings for the docket API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub token:    String,
}

/// Body of `GET /api/review/:id/export`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewExport {
  pub exported_at: DateTime<Utc>,
  pub review:      ReviewCandidate,
}

/// Body of `POST /api/review/:id/webhook`.
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookDelivery {
  pub delivered:    bool,
  pub review_id:    Uuid,
  pub delivered_at: DateTime<Utc>,
}

/// Body of `POST /api/decisions`.
#[derive(Debug, Serialize)]
pub struct NewDecisionBody {
  pub title:      String,
  pub area:       String,
  pub impact:     String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub decided_at: Option<DateTime<Utc>>,
}

/// Async HTTP client for the docket JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  async fn send<T: DeserializeOwned>(
    &self,
    req: reqwest::RequestBuilder,
    what: &str,
  ) -> Result<T> {
    let resp = req
      .bearer_auth(&self.config.token)
      .send()
      .await
      .with_context(|| format!("{what} failed"))?;
    decode(resp, what).await
  }

  // ── Review ────────────────────────────────────────────────────────────────

  /// `GET /api/review`
  pub async fn review(&self) -> Result<ReviewSnapshot> {
    self.send(self.client.get(self.url("/review")), "GET /review").await
  }

  /// `GET /api/review/:id/export`
  pub async fn export(&self, id: Uuid) -> Result<ReviewExport> {
    let path = format!("/review/{id}/export");
    self.send(self.client.get(self.url(&path)), &format!("GET {path}")).await
  }

  /// `POST /api/review/:id/webhook`
  pub async fn webhook(&self, id: Uuid) -> Result<WebhookDelivery> {
    let path = format!("/review/{id}/webhook");
    self.send(self.client.post(self.url(&path)), &format!("POST {path}")).await
  }

  // ── Decisions ─────────────────────────────────────────────────────────────

  /// `GET /api/decisions`
  pub async fn list_decisions(&self) -> Result<Vec<ResolvedDecision>> {
    self.send(self.client.get(self.url("/decisions")), "GET /decisions").await
  }

  /// `POST /api/decisions`
  pub async fn create_decision(&self, body: &NewDecisionBody) -> Result<ResolvedDecision> {
    self
      .send(self.client.post(self.url("/decisions")).json(body), "POST /decisions")
      .await
  }

  /// `POST /api/decisions/:id/snapshots`
  pub async fn snapshot(&self, id: Uuid, note: Option<String>) -> Result<ResolvedDecision> {
    let path = format!("/decisions/{id}/snapshots");
    let req = self
      .client
      .post(self.url(&path))
      .json(&serde_json::json!({ "note": note }));
    self.send(req, &format!("POST {path}")).await
  }

  /// `POST /api/decisions/:id/lock`
  pub async fn lock(&self, id: Uuid) -> Result<ResolvedDecision> {
    let path = format!("/decisions/{id}/lock");
    self.send(self.client.post(self.url(&path)), &format!("POST {path}")).await
  }

  /// `POST /api/decisions/:id/archive`
  pub async fn archive(&self, id: Uuid) -> Result<ResolvedDecision> {
    let path = format!("/decisions/{id}/archive");
    self.send(self.client.post(self.url(&path)), &format!("POST {path}")).await
  }

  // ── Audit ─────────────────────────────────────────────────────────────────

  /// `GET /api/decisions/:id/audit`, or `GET /api/audit` for the whole log.
  pub async fn audit(&self, id: Option<Uuid>) -> Result<Vec<AuditEvent>> {
    let path = match id {
      Some(id) => format!("/decisions/{id}/audit"),
      None => "/audit".to_string(),
    };
    self.send(self.client.get(self.url(&path)), &format!("GET {path}")).await
  }
}

/// Deserialise a success body, or turn the server's `{"error": ...}` body
/// into an error.
async fn decode<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
  let status = resp.status();
  if !status.is_success() {
    let message = resp
      .json::<serde_json::Value>()
      .await
      .ok()
      .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
      .unwrap_or_else(|| status.to_string());
    return Err(anyhow!("{what} → {status}: {message}"));
  }
  resp.json().await.with_context(|| format!("deserialising {what}"))
}
