use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    application::{
        handlers::batch_dispatcher::{DispatchJob, OutboundSms},
        services::personalizer,
    },
    domain::{
        eligibility,
        models::{BusinessSettings, FailureReason, FeedbackCandidate},
        repositories::FeedbackRequestRepository,
    },
};

/// Dispatch strategy for post-visit feedback requests. Due when the visit
/// checked out at least `feedback_delay_minutes` ago; the delay comes from
/// the settings snapshot taken at the start of the run.
pub struct FeedbackDispatchJob {
    repo: Arc<dyn FeedbackRequestRepository>,
    settings: BusinessSettings,
    app_url: String,
    salon_name: String,
}

impl FeedbackDispatchJob {
    pub fn new(
        repo: Arc<dyn FeedbackRequestRepository>,
        settings: BusinessSettings,
        app_url: String,
        salon_name: String,
    ) -> Self {
        Self {
            repo,
            settings,
            app_url,
            salon_name,
        }
    }
}

#[async_trait]
impl DispatchJob for FeedbackDispatchJob {
    type Candidate = FeedbackCandidate;

    fn name(&self) -> &'static str {
        "feedback"
    }

    fn candidate_id(&self, candidate: &FeedbackCandidate) -> Uuid {
        candidate.request.id
    }

    async fn load_due(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<FeedbackCandidate>> {
        let cutoff = now - Duration::minutes(i64::from(self.settings.feedback_delay_minutes));
        self.repo.list_due(cutoff).await
    }

    fn prepare(&self, candidate: &FeedbackCandidate) -> Result<OutboundSms, FailureReason> {
        eligibility::check_feedback(&candidate.customer)?;

        let url = personalizer::feedback_url(&self.app_url, candidate.request.id);
        let body = personalizer::render_feedback(
            candidate.customer.first_name(),
            &self.salon_name,
            &url,
        );
        Ok(OutboundSms {
            destination: candidate.customer.phone.clone(),
            body,
        })
    }

    async fn record_sent(
        &self,
        candidate: &FeedbackCandidate,
        sent_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let updated = self.repo.mark_sent(candidate.request.id, sent_at).await?;
        if !updated {
            anyhow::bail!("feedback request {} was no longer pending", candidate.request.id);
        }
        Ok(())
    }

    async fn record_failed(
        &self,
        candidate: &FeedbackCandidate,
        reason: FailureReason,
    ) -> anyhow::Result<()> {
        self.repo.mark_failed(candidate.request.id, &reason).await?;
        Ok(())
    }
}
