use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::application::services::classifier::{Classification, IssueClassifier};

pub struct AiWorkerClassifier {
    http: Client,
    base_url: String,
}

impl AiWorkerClassifier {
    pub fn new(base_url: String) -> Arc<dyn IssueClassifier> {
        Arc::new(Self {
            http: Client::builder()
                .user_agent("salon-growth/ai-worker")
                .build()
                .expect("failed to build ai worker client"),
            base_url,
        }) as Arc<dyn IssueClassifier>
    }
}

#[async_trait]
impl IssueClassifier for AiWorkerClassifier {
    async fn classify(&self, text: &str) -> anyhow::Result<Classification> {
        let url = format!("{}/classify", self.base_url);
        let response = self
            .http
            .post(url)
            .json(&json!({ "text": text }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("ai worker returned status {status}");
        }

        Ok(response.json().await?)
    }
}
