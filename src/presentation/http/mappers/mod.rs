use crate::{
    application::{
        handlers::batch_dispatcher::DispatchSummary, usecases::run_campaign_sweep::CampaignSweepResult,
    },
    domain::models::BusinessSettings,
    presentation::http::responses::{
        CampaignSweepResultDto, DispatchSummaryDto, RunDailyResponseDto, SettingsDto,
    },
};

pub fn map_summary(summary: &DispatchSummary) -> DispatchSummaryDto {
    DispatchSummaryDto {
        success: true,
        sent_count: summary.sent_count,
        failed_count: summary.failed_count,
        total_processed: summary.total_candidates,
    }
}

pub fn map_sweep_results(results: &[CampaignSweepResult]) -> RunDailyResponseDto {
    RunDailyResponseDto {
        success: true,
        total_created: results.iter().map(|r| r.messages_created).sum(),
        campaigns: results
            .iter()
            .map(|r| CampaignSweepResultDto {
                campaign: r.campaign_name.clone(),
                messages_created: r.messages_created,
            })
            .collect(),
    }
}

pub fn map_settings(settings: &BusinessSettings) -> SettingsDto {
    SettingsDto {
        feedback_delay_minutes: settings.feedback_delay_minutes,
        low_rating_threshold: settings.low_rating_threshold,
        promoter_threshold: settings.promoter_threshold,
        winback_inactive_days: settings.winback_inactive_days,
        winback_cooldown_days: settings.winback_cooldown_days,
        google_review_url: settings.google_review_url.clone(),
        yelp_review_url: settings.yelp_review_url.clone(),
        average_ticket_price: settings.average_ticket_price,
    }
}
