use std::sync::Arc;

use poem_openapi::Tags;

use crate::{
    application::{
        services::sms::SmsGateway,
        usecases::{
            run_campaign_sweep::RunCampaignSweepUseCase, submit_feedback::SubmitFeedbackUseCase,
            update_settings::UpdateSettingsUseCase,
        },
    },
    domain::repositories::{
        FeedbackRequestRepository, SettingsRepository, WinbackMessageRepository,
    },
};

#[derive(Clone)]
pub struct ApiState {
    pub feedback_repo: Arc<dyn FeedbackRequestRepository>,
    pub winback_repo: Arc<dyn WinbackMessageRepository>,
    pub settings_repo: Arc<dyn SettingsRepository>,
    pub sms_gateway: Arc<dyn SmsGateway>,
    pub submit_feedback_usecase: Arc<SubmitFeedbackUseCase>,
    pub campaign_sweep_usecase: Arc<RunCampaignSweepUseCase>,
    pub update_settings_usecase: Arc<UpdateSettingsUseCase>,
    pub app_url: String,
    pub salon_name: String,
    pub scheduler_secret: String,
}

pub struct Endpoints;

/// Enum of API sections (tags)
#[derive(Tags)]
pub enum EndpointsTags {
    Health,
    Dispatch,
    Feedback,
    Settings,
}
