use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::campaign::WinbackCampaign;
use super::customer::Customer;

/// Lifecycle of an outbound message intent. `Pending` intents are the only
/// ones a dispatch run selects; `Failed` is terminal (no automatic retry).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum IntentStatus {
    Pending,
    Sent,
    Failed { reason: FailureReason },
}

impl IntentStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, IntentStatus::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum FailureReason {
    OptedOut,
    CampaignInactive,
    NoDestination,
    Delivery { message: String },
}

impl FailureReason {
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::OptedOut => "opted_out",
            FailureReason::CampaignInactive => "campaign_inactive",
            FailureReason::NoDestination => "no_destination",
            FailureReason::Delivery { .. } => "delivery_error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub id: Uuid,
    pub visit_id: Uuid,
    pub status: IntentStatus,
    pub rating: Option<i32>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl FeedbackRequest {
    pub fn has_response(&self) -> bool {
        self.rating.is_some() || self.responded_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinbackMessage {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub customer_id: Uuid,
    pub status: IntentStatus,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

/// A due feedback request joined with the context the dispatcher needs:
/// the checkout time that made it due and the recipient record.
#[derive(Debug, Clone)]
pub struct FeedbackCandidate {
    pub request: FeedbackRequest,
    pub checkout_time: DateTime<Utc>,
    pub customer: Customer,
}

#[derive(Debug, Clone)]
pub struct WinbackCandidate {
    pub message: WinbackMessage,
    pub customer: Customer,
    pub campaign: WinbackCampaign,
}
