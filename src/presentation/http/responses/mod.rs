use poem_openapi::Object;
use uuid::Uuid;

#[derive(Object)]
#[oai(rename_all = "camelCase")]
pub struct DispatchSummaryDto {
    pub success: bool,
    pub sent_count: u32,
    pub failed_count: u32,
    pub total_processed: u32,
}

#[derive(Object)]
#[oai(rename_all = "camelCase")]
pub struct RunErrorDto {
    pub success: bool,
    pub error: String,
    pub message: String,
}

#[derive(Object)]
#[oai(rename_all = "camelCase")]
pub struct CampaignSweepResultDto {
    pub campaign: String,
    pub messages_created: u32,
}

#[derive(Object)]
#[oai(rename_all = "camelCase")]
pub struct RunDailyResponseDto {
    pub success: bool,
    pub campaigns: Vec<CampaignSweepResultDto>,
    pub total_created: u32,
}

#[derive(Object)]
#[oai(rename_all = "camelCase")]
pub struct SubmitFeedbackResponseDto {
    pub success: bool,
    pub request_id: Uuid,
    pub rating: i32,
    pub responded_at: String,
}

#[derive(Object)]
#[oai(rename_all = "camelCase")]
pub struct SettingsDto {
    pub feedback_delay_minutes: u32,
    pub low_rating_threshold: u8,
    pub promoter_threshold: u8,
    pub winback_inactive_days: u32,
    pub winback_cooldown_days: u32,
    pub google_review_url: String,
    pub yelp_review_url: String,
    pub average_ticket_price: f64,
}
