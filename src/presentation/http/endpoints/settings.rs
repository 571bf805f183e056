use std::sync::Arc;

use poem::Result as PoemResult;
use poem_openapi::{OpenApi, payload::Json};

use crate::{
    application::usecases::update_settings::SettingsPatch,
    domain::errors::DomainError,
    presentation::http::{
        endpoints::root::{ApiState, EndpointsTags},
        mappers::map_settings,
        requests::UpdateSettingsRequestDto,
        responses::SettingsDto,
        security::SchedulerAuth,
    },
};

#[derive(Clone)]
pub struct SettingsEndpoints {
    state: Arc<ApiState>,
}

impl SettingsEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl SettingsEndpoints {
    #[oai(path = "/settings", method = "get", tag = EndpointsTags::Settings)]
    pub async fn get_settings(&self, auth: SchedulerAuth) -> PoemResult<Json<SettingsDto>> {
        auth.verify(&self.state.scheduler_secret)?;

        let settings = self
            .state
            .settings_repo
            .load()
            .await
            .map_err(internal_error)?;
        Ok(Json(map_settings(&settings)))
    }

    #[oai(path = "/settings", method = "put", tag = EndpointsTags::Settings)]
    pub async fn update_settings(
        &self,
        auth: SchedulerAuth,
        request: Json<UpdateSettingsRequestDto>,
    ) -> PoemResult<Json<SettingsDto>> {
        auth.verify(&self.state.scheduler_secret)?;

        let request = request.0;
        let updated = self
            .state
            .update_settings_usecase
            .execute(SettingsPatch {
                feedback_delay_minutes: request.feedback_delay_minutes,
                low_rating_threshold: request.low_rating_threshold,
                promoter_threshold: request.promoter_threshold,
                winback_inactive_days: request.winback_inactive_days,
                winback_cooldown_days: request.winback_cooldown_days,
                google_review_url: request.google_review_url,
                yelp_review_url: request.yelp_review_url,
                average_ticket_price: request.average_ticket_price,
            })
            .await
            .map_err(domain_error)?;

        Ok(Json(map_settings(&updated)))
    }
}

fn domain_error(err: DomainError) -> poem::Error {
    let status = match &err {
        DomainError::Validation(_) => poem::http::StatusCode::BAD_REQUEST,
        DomainError::NotFound(_) => poem::http::StatusCode::NOT_FOUND,
        DomainError::Conflict(_) => poem::http::StatusCode::CONFLICT,
        DomainError::Other(_) => poem::http::StatusCode::INTERNAL_SERVER_ERROR,
    };
    poem::Error::from_string(err.to_string(), status)
}

fn internal_error(err: anyhow::Error) -> poem::Error {
    poem::Error::from_string(
        err.to_string(),
        poem::http::StatusCode::INTERNAL_SERVER_ERROR,
    )
}
