use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::domain::{
    models::BusinessSettings,
    repositories::{CampaignRepository, CustomerRepository, WinbackMessageRepository},
};

/// Daily producer for the winback pipeline: for every active campaign, find
/// opted-in customers whose most recent completed visit falls inside the
/// campaign's day range and create a pending intent for each, at most one
/// per customer+campaign pairing, honoring the cross-campaign cooldown.
pub struct RunCampaignSweepUseCase {
    campaign_repo: Arc<dyn CampaignRepository>,
    customer_repo: Arc<dyn CustomerRepository>,
    winback_repo: Arc<dyn WinbackMessageRepository>,
}

#[derive(Debug, Clone)]
pub struct CampaignSweepResult {
    pub campaign_name: String,
    pub messages_created: u32,
}

impl RunCampaignSweepUseCase {
    pub fn new(
        campaign_repo: Arc<dyn CampaignRepository>,
        customer_repo: Arc<dyn CustomerRepository>,
        winback_repo: Arc<dyn WinbackMessageRepository>,
    ) -> Self {
        Self {
            campaign_repo,
            customer_repo,
            winback_repo,
        }
    }

    pub async fn execute(
        &self,
        now: DateTime<Utc>,
        settings: &BusinessSettings,
    ) -> anyhow::Result<Vec<CampaignSweepResult>> {
        let campaigns = self.campaign_repo.list_active().await?;
        let customers = self.customer_repo.list_opted_in_with_last_visit().await?;
        let cooldown = Duration::days(i64::from(settings.winback_cooldown_days));

        let mut results = Vec::with_capacity(campaigns.len());

        for campaign in &campaigns {
            let newest = now - Duration::days(i64::from(campaign.min_days_since_last_visit));
            let oldest = now - Duration::days(i64::from(campaign.max_days_since_last_visit));

            let mut messages_created = 0;

            for entry in &customers {
                if entry.last_checkout < oldest || entry.last_checkout > newest {
                    continue;
                }
                if self
                    .winback_repo
                    .exists_for(entry.customer.id, campaign.id)
                    .await?
                {
                    continue;
                }
                if let Some(latest) = self
                    .winback_repo
                    .latest_for_customer(entry.customer.id)
                    .await?
                {
                    if latest > now - cooldown {
                        continue;
                    }
                }

                self.winback_repo
                    .create(campaign, &entry.customer, now)
                    .await?;
                messages_created += 1;
            }

            info!(
                campaign = %campaign.name,
                created = messages_created,
                "campaign sweep finished"
            );
            results.push(CampaignSweepResult {
                campaign_name: campaign.name.clone(),
                messages_created,
            });
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::{
        domain::models::{Customer, CustomerLastVisit, WinbackCampaign},
        infrastructure::repositories::in_memory::{
            InMemoryCampaignRepository, InMemoryCustomerRepository,
            InMemoryWinbackMessageRepository,
        },
    };

    use super::*;

    fn campaign(active: bool, min_days: u32, max_days: u32) -> WinbackCampaign {
        WinbackCampaign {
            id: Uuid::new_v4(),
            name: format!("{min_days}-{max_days} day lapsed"),
            active,
            message_template: "Hi {{firstName}}".to_string(),
            min_days_since_last_visit: min_days,
            max_days_since_last_visit: max_days,
        }
    }

    fn lapsed_customer(days_ago: i64, now: DateTime<Utc>) -> CustomerLastVisit {
        CustomerLastVisit {
            customer: Customer {
                id: Uuid::new_v4(),
                name: Some("Amy Tran".to_string()),
                phone: "+19135550001".to_string(),
                marketing_opt_in: true,
            },
            last_checkout: now - Duration::days(days_ago),
        }
    }

    struct Fixture {
        usecase: RunCampaignSweepUseCase,
        campaigns: Arc<InMemoryCampaignRepository>,
        customers: Arc<InMemoryCustomerRepository>,
        winbacks: Arc<InMemoryWinbackMessageRepository>,
    }

    fn fixture() -> Fixture {
        let campaigns = Arc::new(InMemoryCampaignRepository::new());
        let customers = Arc::new(InMemoryCustomerRepository::new());
        let winbacks = Arc::new(InMemoryWinbackMessageRepository::new());
        Fixture {
            usecase: RunCampaignSweepUseCase::new(
                campaigns.clone(),
                customers.clone(),
                winbacks.clone(),
            ),
            campaigns,
            customers,
            winbacks,
        }
    }

    #[tokio::test]
    async fn creates_intents_only_inside_the_campaign_window() {
        let f = fixture();
        let now = Utc::now();
        f.campaigns.insert(campaign(true, 60, 90)).await;
        f.customers.insert(lapsed_customer(59, now)).await;
        f.customers.insert(lapsed_customer(75, now)).await;
        f.customers.insert(lapsed_customer(91, now)).await;

        let results = f
            .usecase
            .execute(now, &BusinessSettings::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].messages_created, 1);
        assert_eq!(f.winbacks.pending_count().await, 1);
    }

    #[tokio::test]
    async fn inactive_campaigns_are_skipped() {
        let f = fixture();
        let now = Utc::now();
        f.campaigns.insert(campaign(false, 60, 90)).await;
        f.customers.insert(lapsed_customer(75, now)).await;

        let results = f
            .usecase
            .execute(now, &BusinessSettings::default())
            .await
            .unwrap();

        assert!(results.is_empty());
        assert_eq!(f.winbacks.pending_count().await, 0);
    }

    #[tokio::test]
    async fn a_customer_is_messaged_once_per_campaign() {
        let f = fixture();
        let now = Utc::now();
        f.campaigns.insert(campaign(true, 60, 90)).await;
        f.customers.insert(lapsed_customer(75, now)).await;
        let settings = BusinessSettings::default();

        f.usecase.execute(now, &settings).await.unwrap();
        let second = f.usecase.execute(now, &settings).await.unwrap();

        assert_eq!(second[0].messages_created, 0);
        assert_eq!(f.winbacks.pending_count().await, 1);
    }

    #[tokio::test]
    async fn cooldown_blocks_a_second_campaign_within_the_window() {
        let f = fixture();
        let now = Utc::now();
        let entry = lapsed_customer(75, now);
        // Customer qualifies for two overlapping campaigns; the cooldown
        // keeps the second campaign from messaging them right away.
        f.campaigns.insert(campaign(true, 60, 90)).await;
        f.campaigns.insert(campaign(true, 70, 80)).await;
        f.customers.insert(entry).await;

        let results = f
            .usecase
            .execute(now, &BusinessSettings::default())
            .await
            .unwrap();

        let created: u32 = results.iter().map(|r| r.messages_created).sum();
        assert_eq!(created, 1);
    }
}
