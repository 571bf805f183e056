use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{application::services::sms::SmsGateway, domain::models::FailureReason};

/// A rendered message ready for the transport.
#[derive(Debug, Clone)]
pub struct OutboundSms {
    pub destination: String,
    pub body: String,
}

/// Per-kind strategy for one dispatch run: which intents are due, whether a
/// candidate is still eligible, how its body is rendered, and how the
/// outcome is recorded. One implementation per message class.
#[async_trait]
pub trait DispatchJob: Send + Sync {
    type Candidate: Send + Sync;

    fn name(&self) -> &'static str;

    fn candidate_id(&self, candidate: &Self::Candidate) -> Uuid;

    /// Selection query. A failure here aborts the run before any candidate
    /// is touched.
    async fn load_due(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<Self::Candidate>>;

    /// Eligibility check plus personalization. Pure; an `Err` marks the
    /// intent failed without reaching the transport.
    fn prepare(&self, candidate: &Self::Candidate) -> Result<OutboundSms, FailureReason>;

    async fn record_sent(
        &self,
        candidate: &Self::Candidate,
        sent_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;

    async fn record_failed(
        &self,
        candidate: &Self::Candidate,
        reason: FailureReason,
    ) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub total_candidates: u32,
    pub sent_count: u32,
    pub failed_count: u32,
}

/// One idempotent pass over due intents of a single kind. Candidates are
/// processed strictly sequentially; a bad recipient or provider error never
/// stops the batch. Re-running immediately after a successful run is a
/// no-op because processed intents are no longer pending.
pub struct BatchDispatcher<J> {
    job: J,
    gateway: Arc<dyn SmsGateway>,
}

impl<J: DispatchJob> BatchDispatcher<J> {
    pub fn new(job: J, gateway: Arc<dyn SmsGateway>) -> Self {
        Self { job, gateway }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> anyhow::Result<DispatchSummary> {
        let candidates = self.job.load_due(now).await?;

        let mut summary = DispatchSummary {
            total_candidates: candidates.len() as u32,
            ..DispatchSummary::default()
        };
        info!(
            job = self.job.name(),
            candidates = candidates.len(),
            "dispatch run started"
        );

        for candidate in &candidates {
            let intent_id = self.job.candidate_id(candidate);

            let outbound = match self.job.prepare(candidate) {
                Ok(outbound) => outbound,
                Err(reason) => {
                    warn!(
                        job = self.job.name(),
                        intent = %intent_id,
                        reason = reason.code(),
                        "candidate no longer eligible"
                    );
                    self.record_failure(candidate, intent_id, reason).await;
                    summary.failed_count += 1;
                    continue;
                }
            };

            match self.gateway.send(&outbound.destination, &outbound.body).await {
                Ok(provider_id) => {
                    summary.sent_count += 1;
                    if let Err(err) = self.job.record_sent(candidate, Utc::now()).await {
                        // Delivered but not recorded: the next run may pick
                        // this intent up again and double-send.
                        error!(
                            job = self.job.name(),
                            intent = %intent_id,
                            provider_id = %provider_id,
                            error = ?err,
                            "CRITICAL: message delivered but status update failed"
                        );
                    }
                }
                Err(err) => {
                    warn!(
                        job = self.job.name(),
                        intent = %intent_id,
                        error = %err,
                        "delivery failed"
                    );
                    let reason = FailureReason::Delivery {
                        message: err.to_string(),
                    };
                    self.record_failure(candidate, intent_id, reason).await;
                    summary.failed_count += 1;
                }
            }
        }

        info!(
            job = self.job.name(),
            sent = summary.sent_count,
            failed = summary.failed_count,
            "dispatch run finished"
        );
        Ok(summary)
    }

    async fn record_failure(
        &self,
        candidate: &J::Candidate,
        intent_id: Uuid,
        reason: FailureReason,
    ) {
        if let Err(err) = self.job.record_failed(candidate, reason).await {
            error!(
                job = self.job.name(),
                intent = %intent_id,
                error = ?err,
                "failed to record failure status"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tokio::sync::Mutex;

    use super::*;
    use crate::{
        application::{
            services::sms::DeliveryError,
            usecases::{
                send_pending_feedback::FeedbackDispatchJob,
                send_pending_winback::WinbackDispatchJob,
            },
        },
        domain::{
            models::{
                BusinessSettings, Customer, FeedbackCandidate, FeedbackRequest, IntentStatus,
                WinbackCampaign, WinbackCandidate, WinbackMessage,
            },
            repositories::FeedbackRequestRepository,
        },
        infrastructure::repositories::in_memory::{
            InMemoryFeedbackRequestRepository, InMemoryWinbackMessageRepository,
        },
    };

    struct FakeSms {
        calls: Mutex<Vec<(String, String)>>,
        fail_destinations: Vec<String>,
    }

    impl FakeSms {
        fn new() -> Arc<Self> {
            Self::failing_on(&[])
        }

        fn failing_on(destinations: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail_destinations: destinations.iter().map(ToString::to_string).collect(),
            })
        }

        async fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().await.clone()
        }
    }

    #[async_trait]
    impl SmsGateway for FakeSms {
        async fn send(&self, destination: &str, body: &str) -> Result<String, DeliveryError> {
            if self.fail_destinations.iter().any(|d| d == destination) {
                return Err(DeliveryError::Provider {
                    status: 400,
                    message: "blocked number".to_string(),
                });
            }
            self.calls
                .lock()
                .await
                .push((destination.to_string(), body.to_string()));
            Ok(format!("SM{}", self.calls.lock().await.len()))
        }
    }

    fn customer(phone: &str, opt_in: bool) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            name: Some("Amy Tran".to_string()),
            phone: phone.to_string(),
            marketing_opt_in: opt_in,
        }
    }

    fn campaign() -> WinbackCampaign {
        WinbackCampaign {
            id: Uuid::new_v4(),
            name: "60 day lapsed".to_string(),
            active: true,
            message_template: "Hi {{firstName}}, book again: {{bookingLink}}".to_string(),
            min_days_since_last_visit: 60,
            max_days_since_last_visit: 90,
        }
    }

    fn feedback_candidate(phone: &str, checked_out: DateTime<Utc>) -> FeedbackCandidate {
        FeedbackCandidate {
            request: FeedbackRequest {
                id: Uuid::new_v4(),
                visit_id: Uuid::new_v4(),
                status: IntentStatus::Pending,
                rating: None,
                comment: None,
                created_at: checked_out,
                sent_at: None,
                responded_at: None,
            },
            checkout_time: checked_out,
            customer: customer(phone, true),
        }
    }

    fn winback_candidate(customer: Customer, campaign: WinbackCampaign) -> WinbackCandidate {
        WinbackCandidate {
            message: WinbackMessage {
                id: Uuid::new_v4(),
                campaign_id: campaign.id,
                customer_id: customer.id,
                status: IntentStatus::Pending,
                created_at: Utc::now(),
                sent_at: None,
            },
            customer,
            campaign,
        }
    }

    fn feedback_dispatcher(
        repo: &Arc<InMemoryFeedbackRequestRepository>,
        sms: Arc<FakeSms>,
    ) -> BatchDispatcher<FeedbackDispatchJob> {
        BatchDispatcher::new(feedback_job(repo), sms)
    }

    fn winback_dispatcher(
        repo: &Arc<InMemoryWinbackMessageRepository>,
        sms: Arc<FakeSms>,
    ) -> BatchDispatcher<WinbackDispatchJob> {
        let job = WinbackDispatchJob::new(repo.clone(), "https://example.com/book".to_string());
        BatchDispatcher::new(job, sms)
    }

    fn feedback_job(repo: &Arc<InMemoryFeedbackRequestRepository>) -> FeedbackDispatchJob {
        FeedbackDispatchJob::new(
            repo.clone(),
            BusinessSettings::default(),
            "https://example.com".to_string(),
            "G Nail Pines".to_string(),
        )
    }

    /// Delegates to the real feedback job but loses the status update for
    /// one intent after its message was delivered.
    struct UnrecordableSendJob {
        inner: FeedbackDispatchJob,
        lost: Uuid,
    }

    #[async_trait]
    impl DispatchJob for UnrecordableSendJob {
        type Candidate = FeedbackCandidate;

        fn name(&self) -> &'static str {
            self.inner.name()
        }

        fn candidate_id(&self, candidate: &FeedbackCandidate) -> Uuid {
            self.inner.candidate_id(candidate)
        }

        async fn load_due(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<FeedbackCandidate>> {
            self.inner.load_due(now).await
        }

        fn prepare(&self, candidate: &FeedbackCandidate) -> Result<OutboundSms, FailureReason> {
            self.inner.prepare(candidate)
        }

        async fn record_sent(
            &self,
            candidate: &FeedbackCandidate,
            sent_at: DateTime<Utc>,
        ) -> anyhow::Result<()> {
            if candidate.request.id == self.lost {
                anyhow::bail!("connection reset during status update");
            }
            self.inner.record_sent(candidate, sent_at).await
        }

        async fn record_failed(
            &self,
            candidate: &FeedbackCandidate,
            reason: FailureReason,
        ) -> anyhow::Result<()> {
            self.inner.record_failed(candidate, reason).await
        }
    }

    /// Delegates to the real feedback job but fails the selection query.
    struct BrokenSelectionJob {
        inner: FeedbackDispatchJob,
    }

    #[async_trait]
    impl DispatchJob for BrokenSelectionJob {
        type Candidate = FeedbackCandidate;

        fn name(&self) -> &'static str {
            self.inner.name()
        }

        fn candidate_id(&self, candidate: &FeedbackCandidate) -> Uuid {
            self.inner.candidate_id(candidate)
        }

        async fn load_due(&self, _now: DateTime<Utc>) -> anyhow::Result<Vec<FeedbackCandidate>> {
            anyhow::bail!("connection refused")
        }

        fn prepare(&self, candidate: &FeedbackCandidate) -> Result<OutboundSms, FailureReason> {
            self.inner.prepare(candidate)
        }

        async fn record_sent(
            &self,
            candidate: &FeedbackCandidate,
            sent_at: DateTime<Utc>,
        ) -> anyhow::Result<()> {
            self.inner.record_sent(candidate, sent_at).await
        }

        async fn record_failed(
            &self,
            candidate: &FeedbackCandidate,
            reason: FailureReason,
        ) -> anyhow::Result<()> {
            self.inner.record_failed(candidate, reason).await
        }
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let repo = Arc::new(InMemoryFeedbackRequestRepository::new());
        let due = Utc::now() - Duration::hours(2);
        for n in 0..3 {
            repo.insert(feedback_candidate(&format!("+1913555000{n}"), due))
                .await;
        }
        let sms = FakeSms::new();
        let dispatcher = feedback_dispatcher(&repo, sms.clone());

        let first = dispatcher.run(Utc::now()).await.unwrap();
        assert_eq!(first.total_candidates, 3);
        assert_eq!(first.sent_count, 3);
        assert_eq!(first.failed_count, 0);

        let second = dispatcher.run(Utc::now()).await.unwrap();
        assert_eq!(second, DispatchSummary::default());
        assert_eq!(sms.calls().await.len(), 3);
    }

    #[tokio::test]
    async fn one_delivery_failure_does_not_stop_the_batch() {
        let repo = Arc::new(InMemoryFeedbackRequestRepository::new());
        let due = Utc::now() - Duration::hours(2);
        let first = feedback_candidate("+19135550001", due);
        let second = feedback_candidate("+19135550002", due - Duration::minutes(1));
        let third = feedback_candidate("+19135550003", due - Duration::minutes(2));
        let ids = [first.request.id, second.request.id, third.request.id];
        // Oldest checkout goes first, so the failing number is processed 2nd.
        repo.insert(third.clone()).await;
        repo.insert(second.clone()).await;
        repo.insert(first.clone()).await;

        let sms = FakeSms::failing_on(&["+19135550002"]);
        let summary = feedback_dispatcher(&repo, sms.clone())
            .run(Utc::now())
            .await
            .unwrap();

        assert_eq!(summary.total_candidates, 3);
        assert_eq!(summary.sent_count, 2);
        assert_eq!(summary.failed_count, 1);

        let statuses: Vec<IntentStatus> = {
            let mut out = Vec::new();
            for id in ids {
                out.push(repo.get(id).await.unwrap().unwrap().status);
            }
            out
        };
        assert_eq!(statuses[0], IntentStatus::Sent);
        assert!(matches!(statuses[1], IntentStatus::Failed { .. }));
        assert_eq!(statuses[2], IntentStatus::Sent);
    }

    #[tokio::test]
    async fn sent_at_set_exactly_when_sent() {
        let repo = Arc::new(InMemoryFeedbackRequestRepository::new());
        let due = Utc::now() - Duration::hours(1);
        let ok = feedback_candidate("+19135550001", due);
        let bad = feedback_candidate("+19135550002", due);
        repo.insert(ok.clone()).await;
        repo.insert(bad.clone()).await;

        let sms = FakeSms::failing_on(&["+19135550002"]);
        feedback_dispatcher(&repo, sms).run(Utc::now()).await.unwrap();

        let sent = repo.get(ok.request.id).await.unwrap().unwrap();
        assert_eq!(sent.status, IntentStatus::Sent);
        assert!(sent.sent_at.is_some());

        let failed = repo.get(bad.request.id).await.unwrap().unwrap();
        assert!(matches!(failed.status, IntentStatus::Failed { .. }));
        assert!(failed.sent_at.is_none());
    }

    #[tokio::test]
    async fn opted_out_winback_never_reaches_the_transport() {
        let repo = Arc::new(InMemoryWinbackMessageRepository::new());
        let campaign = campaign();
        let opted_out = winback_candidate(customer("+19135550001", false), campaign.clone());
        let opted_in = winback_candidate(customer("+19135550002", true), campaign);
        repo.insert(opted_out.clone()).await;
        repo.insert(opted_in.clone()).await;

        let sms = FakeSms::new();
        let summary = winback_dispatcher(&repo, sms.clone())
            .run(Utc::now())
            .await
            .unwrap();

        assert_eq!(summary.sent_count, 1);
        assert_eq!(summary.failed_count, 1);

        let calls = sms.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "+19135550002");

        let failed = repo.get(opted_out.message.id).await.unwrap().unwrap();
        assert_eq!(
            failed.status,
            IntentStatus::Failed {
                reason: crate::domain::models::FailureReason::OptedOut
            }
        );
    }

    #[tokio::test]
    async fn winback_body_comes_from_the_campaign_template() {
        let repo = Arc::new(InMemoryWinbackMessageRepository::new());
        let candidate = winback_candidate(customer("+19135550001", true), campaign());
        repo.insert(candidate).await;

        let sms = FakeSms::new();
        winback_dispatcher(&repo, sms.clone())
            .run(Utc::now())
            .await
            .unwrap();

        let calls = sms.calls().await;
        assert_eq!(
            calls[0].1,
            "Hi Amy, book again: https://example.com/book"
        );
    }

    #[tokio::test]
    async fn jobs_only_touch_their_own_intent_kind() {
        let feedback_repo = Arc::new(InMemoryFeedbackRequestRepository::new());
        let winback_repo = Arc::new(InMemoryWinbackMessageRepository::new());

        let feedback = feedback_candidate("+19135550001", Utc::now() - Duration::hours(1));
        let winback = winback_candidate(customer("+19135550002", true), campaign());
        feedback_repo.insert(feedback.clone()).await;
        winback_repo.insert(winback.clone()).await;

        let sms = FakeSms::new();
        let feedback_job = feedback_dispatcher(&feedback_repo, sms.clone());
        let winback_job = winback_dispatcher(&winback_repo, sms.clone());
        let (feedback_summary, winback_summary) = tokio::join!(
            feedback_job.run(Utc::now()),
            winback_job.run(Utc::now()),
        );

        assert_eq!(feedback_summary.unwrap().sent_count, 1);
        assert_eq!(winback_summary.unwrap().sent_count, 1);
        assert_eq!(
            feedback_repo
                .get(feedback.request.id)
                .await
                .unwrap()
                .unwrap()
                .status,
            IntentStatus::Sent
        );
        assert_eq!(
            winback_repo
                .get(winback.message.id)
                .await
                .unwrap()
                .unwrap()
                .status,
            IntentStatus::Sent
        );
    }

    #[tokio::test]
    async fn lost_status_update_after_delivery_does_not_stop_the_run() {
        let repo = Arc::new(InMemoryFeedbackRequestRepository::new());
        let due = Utc::now() - Duration::hours(2);
        let first = feedback_candidate("+19135550001", due - Duration::minutes(2));
        let second = feedback_candidate("+19135550002", due - Duration::minutes(1));
        let third = feedback_candidate("+19135550003", due);
        repo.insert(first.clone()).await;
        repo.insert(second.clone()).await;
        repo.insert(third.clone()).await;

        let sms = FakeSms::new();
        let job = UnrecordableSendJob {
            inner: feedback_job(&repo),
            lost: second.request.id,
        };
        let summary = BatchDispatcher::new(job, sms.clone())
            .run(Utc::now())
            .await
            .unwrap();

        // The delivered-but-unrecorded message counts as sent, and the
        // candidates after it are still processed.
        assert_eq!(summary.total_candidates, 3);
        assert_eq!(summary.sent_count, 3);
        assert_eq!(summary.failed_count, 0);
        assert_eq!(sms.calls().await.len(), 3);

        let lost = repo.get(second.request.id).await.unwrap().unwrap();
        assert_eq!(lost.status, IntentStatus::Pending);
        let recorded = repo.get(third.request.id).await.unwrap().unwrap();
        assert_eq!(recorded.status, IntentStatus::Sent);
    }

    #[tokio::test]
    async fn selection_failure_aborts_before_any_send() {
        let repo = Arc::new(InMemoryFeedbackRequestRepository::new());
        let candidate = feedback_candidate("+19135550001", Utc::now() - Duration::hours(2));
        repo.insert(candidate.clone()).await;

        let sms = FakeSms::new();
        let job = BrokenSelectionJob {
            inner: feedback_job(&repo),
        };
        let result = BatchDispatcher::new(job, sms.clone()).run(Utc::now()).await;

        assert!(result.is_err());
        assert!(sms.calls().await.is_empty());
        let untouched = repo.get(candidate.request.id).await.unwrap().unwrap();
        assert_eq!(untouched.status, IntentStatus::Pending);
    }

    #[tokio::test]
    async fn failed_intents_are_not_retried_on_later_runs() {
        let repo = Arc::new(InMemoryFeedbackRequestRepository::new());
        let candidate = feedback_candidate("+19135550001", Utc::now() - Duration::hours(2));
        repo.insert(candidate.clone()).await;

        let sms = FakeSms::failing_on(&["+19135550001"]);
        let first = feedback_dispatcher(&repo, sms.clone())
            .run(Utc::now())
            .await
            .unwrap();
        assert_eq!(first.failed_count, 1);

        let second = feedback_dispatcher(&repo, sms)
            .run(Utc::now())
            .await
            .unwrap();
        assert_eq!(second, DispatchSummary::default());
        let terminal = repo.get(candidate.request.id).await.unwrap().unwrap();
        assert!(matches!(terminal.status, IntentStatus::Failed { .. }));
    }
}
