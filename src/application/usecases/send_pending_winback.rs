use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    application::{
        handlers::batch_dispatcher::{DispatchJob, OutboundSms},
        services::personalizer,
    },
    domain::{
        eligibility,
        models::{FailureReason, WinbackCandidate},
        repositories::WinbackMessageRepository,
    },
};

/// Dispatch strategy for winback messages. The campaign day-range was
/// applied when the intent was created, so selection is status-only;
/// eligibility (campaign still active, customer still opted in) is
/// re-checked here at send time.
pub struct WinbackDispatchJob {
    repo: Arc<dyn WinbackMessageRepository>,
    booking_url: String,
}

impl WinbackDispatchJob {
    pub fn new(repo: Arc<dyn WinbackMessageRepository>, booking_url: String) -> Self {
        Self { repo, booking_url }
    }
}

#[async_trait]
impl DispatchJob for WinbackDispatchJob {
    type Candidate = WinbackCandidate;

    fn name(&self) -> &'static str {
        "winback"
    }

    fn candidate_id(&self, candidate: &WinbackCandidate) -> Uuid {
        candidate.message.id
    }

    async fn load_due(&self, _now: DateTime<Utc>) -> anyhow::Result<Vec<WinbackCandidate>> {
        self.repo.list_pending().await
    }

    fn prepare(&self, candidate: &WinbackCandidate) -> Result<OutboundSms, FailureReason> {
        eligibility::check_winback(&candidate.campaign, &candidate.customer)?;

        let body = personalizer::render_winback(
            &candidate.campaign.message_template,
            candidate.customer.first_name(),
            &self.booking_url,
        );
        Ok(OutboundSms {
            destination: candidate.customer.phone.clone(),
            body,
        })
    }

    async fn record_sent(
        &self,
        candidate: &WinbackCandidate,
        sent_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let updated = self.repo.mark_sent(candidate.message.id, sent_at).await?;
        if !updated {
            anyhow::bail!("winback message {} was no longer pending", candidate.message.id);
        }
        Ok(())
    }

    async fn record_failed(
        &self,
        candidate: &WinbackCandidate,
        reason: FailureReason,
    ) -> anyhow::Result<()> {
        self.repo.mark_failed(candidate.message.id, &reason).await?;
        Ok(())
    }
}
