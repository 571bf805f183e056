use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: Uuid,
    pub feedback_request_id: Uuid,
    pub severity: String,
    pub category: String,
    pub summary: String,
    pub status: IssueStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    Resolved,
}

/// Issue fields produced by the classification hook, before persistence.
#[derive(Debug, Clone)]
pub struct NewIssue {
    pub feedback_request_id: Uuid,
    pub severity: String,
    pub category: String,
    pub summary: String,
}
