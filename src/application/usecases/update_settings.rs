use std::sync::Arc;

use crate::domain::{
    errors::DomainError, models::BusinessSettings, repositories::SettingsRepository,
};

pub struct UpdateSettingsUseCase {
    repo: Arc<dyn SettingsRepository>,
}

/// Partial update; unset fields keep their current value.
#[derive(Debug, Default)]
pub struct SettingsPatch {
    pub feedback_delay_minutes: Option<u32>,
    pub low_rating_threshold: Option<u8>,
    pub promoter_threshold: Option<u8>,
    pub winback_inactive_days: Option<u32>,
    pub winback_cooldown_days: Option<u32>,
    pub google_review_url: Option<String>,
    pub yelp_review_url: Option<String>,
    pub average_ticket_price: Option<f64>,
}

impl UpdateSettingsUseCase {
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, patch: SettingsPatch) -> Result<BusinessSettings, DomainError> {
        let mut settings = self.repo.load().await?;

        if let Some(value) = patch.feedback_delay_minutes {
            settings.feedback_delay_minutes = value;
        }
        if let Some(value) = patch.low_rating_threshold {
            settings.low_rating_threshold = value;
        }
        if let Some(value) = patch.promoter_threshold {
            settings.promoter_threshold = value;
        }
        if let Some(value) = patch.winback_inactive_days {
            settings.winback_inactive_days = value;
        }
        if let Some(value) = patch.winback_cooldown_days {
            settings.winback_cooldown_days = value;
        }
        if let Some(value) = patch.google_review_url {
            settings.google_review_url = value;
        }
        if let Some(value) = patch.yelp_review_url {
            settings.yelp_review_url = value;
        }
        if let Some(value) = patch.average_ticket_price {
            settings.average_ticket_price = value;
        }

        validate(&settings)?;
        self.repo.save(&settings).await?;
        Ok(settings)
    }
}

fn validate(settings: &BusinessSettings) -> Result<(), DomainError> {
    if settings.low_rating_threshold > 10 {
        return Err(DomainError::Validation(
            "low rating threshold must be between 0 and 10".to_string(),
        ));
    }
    if settings.promoter_threshold > 10 {
        return Err(DomainError::Validation(
            "promoter threshold must be between 0 and 10".to_string(),
        ));
    }
    if settings.winback_inactive_days < 1 {
        return Err(DomainError::Validation(
            "winback inactive days must be at least 1".to_string(),
        ));
    }
    if settings.average_ticket_price < 0.0 {
        return Err(DomainError::Validation(
            "average ticket price must be non-negative".to_string(),
        ));
    }
    Ok(())
}
