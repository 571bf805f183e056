use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of running a feedback comment through the text-analysis service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub is_issue: bool,
    pub severity: String,
    pub category: String,
    pub summary: String,
}

/// Black-box issue classification. Invoked fire-and-forget after a low
/// rating is submitted; a failure here must never affect the feedback
/// submission itself.
#[async_trait]
pub trait IssueClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> anyhow::Result<Classification>;
}
