use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres};
use tracing::warn;
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

pub type PgPool = Pool<Postgres>;

const SETTINGS_KEY: &str = "business_rules";

#[derive(Clone)]
pub struct PostgresFeedbackRequestRepository {
    pool: PgPool,
}

impl PostgresFeedbackRequestRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl FeedbackRequestRepository for PostgresFeedbackRequestRepository {
    async fn list_due(&self, cutoff: DateTime<Utc>) -> anyhow::Result<Vec<FeedbackCandidate>> {
        let rows = sqlx::query_as::<_, FeedbackCandidateRecord>(
            r#"
            SELECT
                fr.id, fr.visit_id, fr.status, fr.status_reason, fr.rating, fr.comment,
                fr.created_at, fr.sent_at, fr.responded_at,
                v.checkout_time,
                c.id AS customer_id, c.name AS customer_name, c.phone, c.marketing_opt_in
            FROM feedback_requests fr
            JOIN visits v ON v.id = fr.visit_id
            JOIN customers c ON c.id = v.customer_id
            WHERE fr.status = 'pending'
              AND fr.sent_at IS NULL
              AND v.checkout_time IS NOT NULL
              AND v.checkout_time <= $1
            ORDER BY v.checkout_time ASC
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|record| record.try_into()).collect()
    }

    async fn mark_sent(&self, id: Uuid, sent_at: DateTime<Utc>) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE feedback_requests
            SET status = 'sent', status_reason = NULL, sent_at = $2
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(sent_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_failed(&self, id: Uuid, reason: &FailureReason) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE feedback_requests
            SET status = 'failed', status_reason = $2
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(failure_reason_to_str(reason))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<FeedbackRequest>> {
        let record = sqlx::query_as::<_, FeedbackRequestRecord>(
            r#"
            SELECT id, visit_id, status, status_reason, rating, comment,
                   created_at, sent_at, responded_at
            FROM feedback_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        record.map(|record| record.try_into()).transpose()
    }

    async fn record_response(
        &self,
        id: Uuid,
        rating: i32,
        comment: Option<String>,
        responded_at: DateTime<Utc>,
    ) -> anyhow::Result<FeedbackRequest> {
        let record = sqlx::query_as::<_, FeedbackRequestRecord>(
            r#"
            UPDATE feedback_requests
            SET rating = $2, comment = $3, responded_at = $4
            WHERE id = $1
            RETURNING id, visit_id, status, status_reason, rating, comment,
                      created_at, sent_at, responded_at
            "#,
        )
        .bind(id)
        .bind(rating)
        .bind(&comment)
        .bind(responded_at)
        .fetch_one(&self.pool)
        .await?;
        record.try_into()
    }
}

#[derive(Clone)]
pub struct PostgresWinbackMessageRepository {
    pool: PgPool,
}

impl PostgresWinbackMessageRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl WinbackMessageRepository for PostgresWinbackMessageRepository {
    async fn list_pending(&self) -> anyhow::Result<Vec<WinbackCandidate>> {
        let rows = sqlx::query_as::<_, WinbackCandidateRecord>(
            r#"
            SELECT
                wm.id, wm.campaign_id, wm.customer_id, wm.status, wm.status_reason,
                wm.created_at, wm.sent_at,
                c.name AS customer_name, c.phone, c.marketing_opt_in,
                wc.name AS campaign_name, wc.active, wc.message_template,
                wc.min_days_since_last_visit, wc.max_days_since_last_visit
            FROM winback_messages wm
            JOIN customers c ON c.id = wm.customer_id
            JOIN winback_campaigns wc ON wc.id = wm.campaign_id
            WHERE wm.status = 'pending'
            ORDER BY wm.created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|record| record.try_into()).collect()
    }

    async fn mark_sent(&self, id: Uuid, sent_at: DateTime<Utc>) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE winback_messages
            SET status = 'sent', status_reason = NULL, sent_at = $2
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(sent_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_failed(&self, id: Uuid, reason: &FailureReason) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE winback_messages
            SET status = 'failed', status_reason = $2
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(failure_reason_to_str(reason))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn create(
        &self,
        campaign: &WinbackCampaign,
        customer: &Customer,
        created_at: DateTime<Utc>,
    ) -> anyhow::Result<WinbackMessage> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO winback_messages (id, campaign_id, customer_id, status, created_at)
            VALUES ($1, $2, $3, 'pending', $4)
            "#,
        )
        .bind(id)
        .bind(campaign.id)
        .bind(customer.id)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(WinbackMessage {
            id,
            campaign_id: campaign.id,
            customer_id: customer.id,
            status: IntentStatus::Pending,
            created_at,
            sent_at: None,
        })
    }

    async fn exists_for(&self, customer_id: Uuid, campaign_id: Uuid) -> anyhow::Result<bool> {
        let exists: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM winback_messages
                WHERE customer_id = $1 AND campaign_id = $2
            )
            "#,
        )
        .bind(customer_id)
        .bind(campaign_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists.0)
    }

    async fn latest_for_customer(
        &self,
        customer_id: Uuid,
    ) -> anyhow::Result<Option<DateTime<Utc>>> {
        let latest: (Option<DateTime<Utc>>,) = sqlx::query_as(
            r#"
            SELECT MAX(created_at) FROM winback_messages WHERE customer_id = $1
            "#,
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(latest.0)
    }
}

#[derive(Clone)]
pub struct PostgresCampaignRepository {
    pool: PgPool,
}

impl PostgresCampaignRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl CampaignRepository for PostgresCampaignRepository {
    async fn list_active(&self) -> anyhow::Result<Vec<WinbackCampaign>> {
        let rows = sqlx::query_as::<_, CampaignRecord>(
            r#"
            SELECT id, name, active, message_template,
                   min_days_since_last_visit, max_days_since_last_visit
            FROM winback_campaigns
            WHERE active = TRUE
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(WinbackCampaign::from).collect())
    }
}

#[derive(Clone)]
pub struct PostgresCustomerRepository {
    pool: PgPool,
}

impl PostgresCustomerRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl CustomerRepository for PostgresCustomerRepository {
    async fn list_opted_in_with_last_visit(&self) -> anyhow::Result<Vec<CustomerLastVisit>> {
        let rows = sqlx::query_as::<_, CustomerLastVisitRecord>(
            r#"
            SELECT c.id, c.name, c.phone, c.marketing_opt_in,
                   MAX(v.checkout_time) AS last_checkout
            FROM customers c
            JOIN visits v ON v.customer_id = c.id
            WHERE c.marketing_opt_in = TRUE
              AND v.checkout_time IS NOT NULL
            GROUP BY c.id, c.name, c.phone, c.marketing_opt_in
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CustomerLastVisit::from).collect())
    }
}

#[derive(Clone)]
pub struct PostgresIssueRepository {
    pool: PgPool,
}

impl PostgresIssueRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl IssueRepository for PostgresIssueRepository {
    async fn create(&self, issue: NewIssue) -> anyhow::Result<Issue> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO issues (id, feedback_request_id, severity, category, summary, status, created_at)
            VALUES ($1, $2, $3, $4, $5, 'open', $6)
            "#,
        )
        .bind(id)
        .bind(issue.feedback_request_id)
        .bind(&issue.severity)
        .bind(&issue.category)
        .bind(&issue.summary)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(Issue {
            id,
            feedback_request_id: issue.feedback_request_id,
            severity: issue.severity,
            category: issue.category,
            summary: issue.summary,
            status: IssueStatus::Open,
            created_at,
        })
    }
}

#[derive(Clone)]
pub struct PostgresSettingsRepository {
    pool: PgPool,
}

impl PostgresSettingsRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl SettingsRepository for PostgresSettingsRepository {
    async fn load(&self) -> anyhow::Result<BusinessSettings> {
        let row: Option<(String,)> =
            sqlx::query_as(r#"SELECT value FROM settings WHERE key = $1"#)
                .bind(SETTINGS_KEY)
                .fetch_optional(&self.pool)
                .await?;

        let Some((value,)) = row else {
            return Ok(BusinessSettings::default());
        };

        // `#[serde(default)]` fills in fields added after this row was
        // written; a malformed row falls back to defaults instead of
        // blocking every dispatch run.
        match serde_json::from_str(&value) {
            Ok(settings) => Ok(settings),
            Err(err) => {
                warn!(error = %err, "stored settings are malformed, using defaults");
                Ok(BusinessSettings::default())
            }
        }
    }

    async fn save(&self, settings: &BusinessSettings) -> anyhow::Result<()> {
        let value = serde_json::to_string(settings)?;
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(SETTINGS_KEY)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(FromRow)]
struct FeedbackRequestRecord {
    id: Uuid,
    visit_id: Uuid,
    status: String,
    status_reason: Option<String>,
    rating: Option<i32>,
    comment: Option<String>,
    created_at: DateTime<Utc>,
    sent_at: Option<DateTime<Utc>>,
    responded_at: Option<DateTime<Utc>>,
}

impl TryFrom<FeedbackRequestRecord> for FeedbackRequest {
    type Error = anyhow::Error;

    fn try_from(value: FeedbackRequestRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            visit_id: value.visit_id,
            status: intent_status_from_fields(&value.status, value.status_reason)?,
            rating: value.rating,
            comment: value.comment,
            created_at: value.created_at,
            sent_at: value.sent_at,
            responded_at: value.responded_at,
        })
    }
}

#[derive(FromRow)]
struct FeedbackCandidateRecord {
    id: Uuid,
    visit_id: Uuid,
    status: String,
    status_reason: Option<String>,
    rating: Option<i32>,
    comment: Option<String>,
    created_at: DateTime<Utc>,
    sent_at: Option<DateTime<Utc>>,
    responded_at: Option<DateTime<Utc>>,
    checkout_time: DateTime<Utc>,
    customer_id: Uuid,
    customer_name: Option<String>,
    phone: String,
    marketing_opt_in: bool,
}

impl TryFrom<FeedbackCandidateRecord> for FeedbackCandidate {
    type Error = anyhow::Error;

    fn try_from(value: FeedbackCandidateRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            request: FeedbackRequest {
                id: value.id,
                visit_id: value.visit_id,
                status: intent_status_from_fields(&value.status, value.status_reason)?,
                rating: value.rating,
                comment: value.comment,
                created_at: value.created_at,
                sent_at: value.sent_at,
                responded_at: value.responded_at,
            },
            checkout_time: value.checkout_time,
            customer: Customer {
                id: value.customer_id,
                name: value.customer_name,
                phone: value.phone,
                marketing_opt_in: value.marketing_opt_in,
            },
        })
    }
}

#[derive(FromRow)]
struct WinbackCandidateRecord {
    id: Uuid,
    campaign_id: Uuid,
    customer_id: Uuid,
    status: String,
    status_reason: Option<String>,
    created_at: DateTime<Utc>,
    sent_at: Option<DateTime<Utc>>,
    customer_name: Option<String>,
    phone: String,
    marketing_opt_in: bool,
    campaign_name: String,
    active: bool,
    message_template: String,
    min_days_since_last_visit: i32,
    max_days_since_last_visit: i32,
}

impl TryFrom<WinbackCandidateRecord> for WinbackCandidate {
    type Error = anyhow::Error;

    fn try_from(value: WinbackCandidateRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            message: WinbackMessage {
                id: value.id,
                campaign_id: value.campaign_id,
                customer_id: value.customer_id,
                status: intent_status_from_fields(&value.status, value.status_reason)?,
                created_at: value.created_at,
                sent_at: value.sent_at,
            },
            customer: Customer {
                id: value.customer_id,
                name: value.customer_name,
                phone: value.phone,
                marketing_opt_in: value.marketing_opt_in,
            },
            campaign: WinbackCampaign {
                id: value.campaign_id,
                name: value.campaign_name,
                active: value.active,
                message_template: value.message_template,
                min_days_since_last_visit: value.min_days_since_last_visit as u32,
                max_days_since_last_visit: value.max_days_since_last_visit as u32,
            },
        })
    }
}

#[derive(FromRow)]
struct CampaignRecord {
    id: Uuid,
    name: String,
    active: bool,
    message_template: String,
    min_days_since_last_visit: i32,
    max_days_since_last_visit: i32,
}

impl From<CampaignRecord> for WinbackCampaign {
    fn from(value: CampaignRecord) -> Self {
        Self {
            id: value.id,
            name: value.name,
            active: value.active,
            message_template: value.message_template,
            min_days_since_last_visit: value.min_days_since_last_visit as u32,
            max_days_since_last_visit: value.max_days_since_last_visit as u32,
        }
    }
}

#[derive(FromRow)]
struct CustomerLastVisitRecord {
    id: Uuid,
    name: Option<String>,
    phone: String,
    marketing_opt_in: bool,
    last_checkout: DateTime<Utc>,
}

impl From<CustomerLastVisitRecord> for CustomerLastVisit {
    fn from(value: CustomerLastVisitRecord) -> Self {
        Self {
            customer: Customer {
                id: value.id,
                name: value.name,
                phone: value.phone,
                marketing_opt_in: value.marketing_opt_in,
            },
            last_checkout: value.last_checkout,
        }
    }
}

fn failure_reason_to_str(reason: &FailureReason) -> String {
    match reason {
        FailureReason::Delivery { message } => message.clone(),
        other => other.code().to_string(),
    }
}

fn intent_status_from_fields(
    status: &str,
    reason: Option<String>,
) -> anyhow::Result<IntentStatus> {
    Ok(match status {
        "pending" => IntentStatus::Pending,
        "sent" => IntentStatus::Sent,
        "failed" => {
            let reason = match reason.as_deref() {
                Some("opted_out") => FailureReason::OptedOut,
                Some("campaign_inactive") => FailureReason::CampaignInactive,
                Some("no_destination") => FailureReason::NoDestination,
                Some(message) => FailureReason::Delivery {
                    message: message.to_string(),
                },
                None => FailureReason::Delivery {
                    message: "failed".to_string(),
                },
            };
            IntentStatus::Failed { reason }
        }
        other => anyhow::bail!("unknown intent status {other}"),
    })
}
