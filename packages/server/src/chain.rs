//! Blockchain anchoring middleware client.
//!
//! Anchoring is a best-effort durability enhancer: every call returns a
//! Result the subscriber logs and drops. The content-addressed store plus
//! the database row remain the source of truth for evidence.

use std::time::Duration;

use serde_json::json;

use crate::config::ChainConfig;

pub struct AnchorClient {
    http: reqwest::Client,
    base_url: String,
}

impl AnchorClient {
    /// Returns `None` when anchoring is not configured.
    pub fn from_config(config: &ChainConfig) -> Option<Self> {
        let base_url = config.base_url.as_ref()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .ok()?;

        Some(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Anchor a milestone evidence hash.
    pub async fn anchor_milestone(
        &self,
        milestone_id: i32,
        project_id: i32,
        sha256: &str,
    ) -> anyhow::Result<()> {
        self.post(
            "milestone",
            json!({
                "milestone_id": milestone_id,
                "project_id": project_id,
                "content_hash": sha256,
            }),
        )
        .await
    }

    /// Anchor a document hash (agreements, receipts).
    pub async fn anchor_document(
        &self,
        document_id: &str,
        sha256: &str,
    ) -> anyhow::Result<()> {
        self.post(
            "document",
            json!({
                "document_id": document_id,
                "content_hash": sha256,
            }),
        )
        .await
    }

    /// Anchor a property evidence hash.
    pub async fn anchor_property(
        &self,
        property_id: i32,
        project_id: i32,
        sha256: &str,
    ) -> anyhow::Result<()> {
        self.post(
            "property",
            json!({
                "property_id": property_id,
                "project_id": project_id,
                "content_hash": sha256,
            }),
        )
        .await
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> anyhow::Result<()> {
        let resp = self
            .http
            .post(format!("{}/{path}", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            anyhow::bail!("anchoring middleware returned {}", resp.status());
        }
        Ok(())
    }
}
