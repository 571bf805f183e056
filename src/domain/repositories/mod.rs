use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::models::{
    BusinessSettings, Customer, CustomerLastVisit, FailureReason, FeedbackCandidate,
    FeedbackRequest, Issue, NewIssue, WinbackCampaign, WinbackCandidate, WinbackMessage,
};

#[async_trait]
pub trait FeedbackRequestRepository: Send + Sync {
    /// Pending requests with `sent_at` unset whose visit checked out at or
    /// before `cutoff`, joined with visit and customer, oldest checkout first.
    async fn list_due(&self, cutoff: DateTime<Utc>) -> anyhow::Result<Vec<FeedbackCandidate>>;

    /// Transition `pending -> sent`. Returns false when the row was no
    /// longer pending, so an overlapping run cannot record a second send.
    async fn mark_sent(&self, id: Uuid, sent_at: DateTime<Utc>) -> anyhow::Result<bool>;

    /// Transition `pending -> failed`. Returns false when the row was no
    /// longer pending.
    async fn mark_failed(&self, id: Uuid, reason: &FailureReason) -> anyhow::Result<bool>;

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<FeedbackRequest>>;

    async fn record_response(
        &self,
        id: Uuid,
        rating: i32,
        comment: Option<String>,
        responded_at: DateTime<Utc>,
    ) -> anyhow::Result<FeedbackRequest>;
}

#[async_trait]
pub trait WinbackMessageRepository: Send + Sync {
    /// All pending winback messages joined with customer and campaign,
    /// oldest first. The day-range window was applied at creation time,
    /// so selection filters on status alone.
    async fn list_pending(&self) -> anyhow::Result<Vec<WinbackCandidate>>;

    async fn mark_sent(&self, id: Uuid, sent_at: DateTime<Utc>) -> anyhow::Result<bool>;

    async fn mark_failed(&self, id: Uuid, reason: &FailureReason) -> anyhow::Result<bool>;

    /// Create a pending intent for a customer+campaign pairing.
    async fn create(
        &self,
        campaign: &WinbackCampaign,
        customer: &Customer,
        created_at: DateTime<Utc>,
    ) -> anyhow::Result<WinbackMessage>;

    /// Whether any intent already exists for this customer+campaign pairing,
    /// regardless of status.
    async fn exists_for(&self, customer_id: Uuid, campaign_id: Uuid) -> anyhow::Result<bool>;

    /// Creation time of the newest winback message to this customer across
    /// all campaigns, for cooldown checks.
    async fn latest_for_customer(
        &self,
        customer_id: Uuid,
    ) -> anyhow::Result<Option<DateTime<Utc>>>;
}

#[async_trait]
pub trait CampaignRepository: Send + Sync {
    async fn list_active(&self) -> anyhow::Result<Vec<WinbackCampaign>>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Opted-in customers that have at least one completed visit, each with
    /// the checkout time of their most recent one.
    async fn list_opted_in_with_last_visit(&self) -> anyhow::Result<Vec<CustomerLastVisit>>;
}

#[async_trait]
pub trait IssueRepository: Send + Sync {
    async fn create(&self, issue: NewIssue) -> anyhow::Result<Issue>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Current settings, falling back to defaults when nothing is stored
    /// or the stored value is malformed.
    async fn load(&self) -> anyhow::Result<BusinessSettings>;

    async fn save(&self, settings: &BusinessSettings) -> anyhow::Result<()>;
}
