use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    models::{
        BusinessSettings, Customer, CustomerLastVisit, FailureReason, FeedbackCandidate,
        FeedbackRequest, IntentStatus, Issue, IssueStatus, NewIssue, WinbackCampaign,
        WinbackCandidate, WinbackMessage,
    },
    repositories::{
        CampaignRepository, CustomerRepository, FeedbackRequestRepository, IssueRepository,
        SettingsRepository, WinbackMessageRepository,
    },
};

#[derive(Default)]
pub struct InMemoryFeedbackRequestRepository {
    candidates: Arc<RwLock<HashMap<Uuid, FeedbackCandidate>>>,
}

impl InMemoryFeedbackRequestRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, candidate: FeedbackCandidate) {
        let mut candidates = self.candidates.write().await;
        candidates.insert(candidate.request.id, candidate);
    }
}

#[async_trait]
impl FeedbackRequestRepository for InMemoryFeedbackRequestRepository {
    async fn list_due(&self, cutoff: DateTime<Utc>) -> anyhow::Result<Vec<FeedbackCandidate>> {
        let candidates = self.candidates.read().await;
        let mut due: Vec<FeedbackCandidate> = candidates
            .values()
            .filter(|c| {
                c.request.status.is_pending()
                    && c.request.sent_at.is_none()
                    && c.checkout_time <= cutoff
            })
            .cloned()
            .collect();
        due.sort_by_key(|c| c.checkout_time);
        Ok(due)
    }

    async fn mark_sent(&self, id: Uuid, sent_at: DateTime<Utc>) -> anyhow::Result<bool> {
        let mut candidates = self.candidates.write().await;
        match candidates.get_mut(&id) {
            Some(candidate) if candidate.request.status.is_pending() => {
                candidate.request.status = IntentStatus::Sent;
                candidate.request.sent_at = Some(sent_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_failed(&self, id: Uuid, reason: &FailureReason) -> anyhow::Result<bool> {
        let mut candidates = self.candidates.write().await;
        match candidates.get_mut(&id) {
            Some(candidate) if candidate.request.status.is_pending() => {
                candidate.request.status = IntentStatus::Failed {
                    reason: reason.clone(),
                };
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<FeedbackRequest>> {
        let candidates = self.candidates.read().await;
        Ok(candidates.get(&id).map(|c| c.request.clone()))
    }

    async fn record_response(
        &self,
        id: Uuid,
        rating: i32,
        comment: Option<String>,
        responded_at: DateTime<Utc>,
    ) -> anyhow::Result<FeedbackRequest> {
        let mut candidates = self.candidates.write().await;
        let candidate = candidates
            .get_mut(&id)
            .ok_or_else(|| anyhow::anyhow!("feedback request {id} not found"))?;
        candidate.request.rating = Some(rating);
        candidate.request.comment = comment;
        candidate.request.responded_at = Some(responded_at);
        Ok(candidate.request.clone())
    }
}

#[derive(Default)]
pub struct InMemoryWinbackMessageRepository {
    candidates: Arc<RwLock<HashMap<Uuid, WinbackCandidate>>>,
}

impl InMemoryWinbackMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, candidate: WinbackCandidate) {
        let mut candidates = self.candidates.write().await;
        candidates.insert(candidate.message.id, candidate);
    }

    pub async fn get(&self, id: Uuid) -> anyhow::Result<Option<WinbackMessage>> {
        let candidates = self.candidates.read().await;
        Ok(candidates.get(&id).map(|c| c.message.clone()))
    }

    pub async fn pending_count(&self) -> usize {
        let candidates = self.candidates.read().await;
        candidates
            .values()
            .filter(|c| c.message.status.is_pending())
            .count()
    }
}

#[async_trait]
impl WinbackMessageRepository for InMemoryWinbackMessageRepository {
    async fn list_pending(&self) -> anyhow::Result<Vec<WinbackCandidate>> {
        let candidates = self.candidates.read().await;
        let mut pending: Vec<WinbackCandidate> = candidates
            .values()
            .filter(|c| c.message.status.is_pending())
            .cloned()
            .collect();
        pending.sort_by_key(|c| c.message.created_at);
        Ok(pending)
    }

    async fn mark_sent(&self, id: Uuid, sent_at: DateTime<Utc>) -> anyhow::Result<bool> {
        let mut candidates = self.candidates.write().await;
        match candidates.get_mut(&id) {
            Some(candidate) if candidate.message.status.is_pending() => {
                candidate.message.status = IntentStatus::Sent;
                candidate.message.sent_at = Some(sent_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_failed(&self, id: Uuid, reason: &FailureReason) -> anyhow::Result<bool> {
        let mut candidates = self.candidates.write().await;
        match candidates.get_mut(&id) {
            Some(candidate) if candidate.message.status.is_pending() => {
                candidate.message.status = IntentStatus::Failed {
                    reason: reason.clone(),
                };
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn create(
        &self,
        campaign: &WinbackCampaign,
        customer: &Customer,
        created_at: DateTime<Utc>,
    ) -> anyhow::Result<WinbackMessage> {
        let message = WinbackMessage {
            id: Uuid::new_v4(),
            campaign_id: campaign.id,
            customer_id: customer.id,
            status: IntentStatus::Pending,
            created_at,
            sent_at: None,
        };
        let mut candidates = self.candidates.write().await;
        candidates.insert(
            message.id,
            WinbackCandidate {
                message: message.clone(),
                customer: customer.clone(),
                campaign: campaign.clone(),
            },
        );
        Ok(message)
    }

    async fn exists_for(&self, customer_id: Uuid, campaign_id: Uuid) -> anyhow::Result<bool> {
        let candidates = self.candidates.read().await;
        Ok(candidates
            .values()
            .any(|c| c.message.customer_id == customer_id && c.message.campaign_id == campaign_id))
    }

    async fn latest_for_customer(
        &self,
        customer_id: Uuid,
    ) -> anyhow::Result<Option<DateTime<Utc>>> {
        let candidates = self.candidates.read().await;
        Ok(candidates
            .values()
            .filter(|c| c.message.customer_id == customer_id)
            .map(|c| c.message.created_at)
            .max())
    }
}

#[derive(Default)]
pub struct InMemoryCampaignRepository {
    campaigns: Arc<RwLock<HashMap<Uuid, WinbackCampaign>>>,
}

impl InMemoryCampaignRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, campaign: WinbackCampaign) {
        let mut campaigns = self.campaigns.write().await;
        campaigns.insert(campaign.id, campaign);
    }
}

#[async_trait]
impl CampaignRepository for InMemoryCampaignRepository {
    async fn list_active(&self) -> anyhow::Result<Vec<WinbackCampaign>> {
        let campaigns = self.campaigns.read().await;
        let mut active: Vec<WinbackCampaign> =
            campaigns.values().filter(|c| c.active).cloned().collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(active)
    }
}

#[derive(Default)]
pub struct InMemoryCustomerRepository {
    entries: Arc<RwLock<Vec<CustomerLastVisit>>>,
}

impl InMemoryCustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, entry: CustomerLastVisit) {
        let mut entries = self.entries.write().await;
        entries.push(entry);
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn list_opted_in_with_last_visit(&self) -> anyhow::Result<Vec<CustomerLastVisit>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| e.customer.marketing_opt_in)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryIssueRepository {
    issues: Arc<RwLock<Vec<Issue>>>,
}

impl InMemoryIssueRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn list(&self) -> Vec<Issue> {
        self.issues.read().await.clone()
    }
}

#[async_trait]
impl IssueRepository for InMemoryIssueRepository {
    async fn create(&self, issue: NewIssue) -> anyhow::Result<Issue> {
        let issue = Issue {
            id: Uuid::new_v4(),
            feedback_request_id: issue.feedback_request_id,
            severity: issue.severity,
            category: issue.category,
            summary: issue.summary,
            status: IssueStatus::Open,
            created_at: Utc::now(),
        };
        let mut issues = self.issues.write().await;
        issues.push(issue.clone());
        Ok(issue)
    }
}

#[derive(Default)]
pub struct InMemorySettingsRepository {
    settings: Arc<RwLock<Option<BusinessSettings>>>,
}

impl InMemorySettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsRepository for InMemorySettingsRepository {
    async fn load(&self) -> anyhow::Result<BusinessSettings> {
        let settings = self.settings.read().await;
        Ok(settings.clone().unwrap_or_default())
    }

    async fn save(&self, settings: &BusinessSettings) -> anyhow::Result<()> {
        let mut stored = self.settings.write().await;
        *stored = Some(settings.clone());
        Ok(())
    }
}
