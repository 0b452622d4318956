// HTTP client for the admin REST API.
//
// A thin reqwest wrapper: one helper builds authorized requests, one
// checks status codes. Response bodies of list endpoints are returned as
// untyped JSON because their envelope differs between backend versions.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde_json::{json, Value};
use tracing::debug;

use super::traits::{ReportQuery, ReportsApi};
use crate::reports::patch::ReportPatch;

/// Default admin API endpoint for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// reqwest-backed implementation of [`ReportsApi`].
pub struct HttpReportsApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpReportsApi {
    /// Create a client for the given base URL. `token`, when present, is
    /// sent as a bearer token on every request.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("arena-admin/0.1")
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(method = %method, url = %url, "Admin API request");
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Response> {
        let response = builder
            .send()
            .await
            .with_context(|| format!("{what} request failed"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("{what} returned {status}: {body}");
        }

        Ok(response)
    }

    async fn send_json(&self, builder: RequestBuilder, what: &str) -> Result<Value> {
        self.send(builder, what)
            .await?
            .json::<Value>()
            .await
            .with_context(|| format!("Failed to parse {what} response"))
    }
}

#[async_trait]
impl ReportsApi for HttpReportsApi {
    async fn list_reports(&self, query: &ReportQuery) -> Result<Value> {
        let builder = self.request(Method::GET, "reports").query(&query.to_params());
        self.send_json(builder, "Report list").await
    }

    async fn list_subject_reports(&self, subject_id: &str) -> Result<Value> {
        let builder = self.request(Method::GET, &format!("reports/user/{subject_id}"));
        self.send_json(builder, "Subject reports").await
    }

    async fn update_report(&self, report_id: &str, patch: &ReportPatch) -> Result<()> {
        let builder = self
            .request(Method::PATCH, &format!("reports/{report_id}"))
            .json(patch);
        self.send(builder, "Report update").await?;
        Ok(())
    }

    async fn delete_report(&self, report_id: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, &format!("reports/{report_id}"));
        self.send(builder, "Report delete").await?;
        Ok(())
    }

    async fn block_subject(&self, subject_id: &str, reason: &str) -> Result<()> {
        let builder = self
            .request(Method::POST, &format!("users/{subject_id}/block"))
            .json(&json!({ "reason": reason }));
        self.send(builder, "Block user").await?;
        Ok(())
    }
}
