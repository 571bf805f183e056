use std::sync::Arc;

use chrono::Utc;
use poem::Result as PoemResult;
use poem_openapi::{ApiResponse, OpenApi, payload::Json};
use tracing::error;

use crate::{
    application::{
        handlers::batch_dispatcher::BatchDispatcher,
        services::personalizer,
        usecases::{
            send_pending_feedback::FeedbackDispatchJob, send_pending_winback::WinbackDispatchJob,
        },
    },
    presentation::http::{
        endpoints::root::{ApiState, EndpointsTags},
        mappers::{map_summary, map_sweep_results},
        responses::{DispatchSummaryDto, RunDailyResponseDto, RunErrorDto},
        security::SchedulerAuth,
    },
};

#[derive(ApiResponse)]
pub enum DispatchRunResponse {
    #[oai(status = 200)]
    Ok(Json<DispatchSummaryDto>),
    #[oai(status = 500)]
    Error(Json<RunErrorDto>),
}

#[derive(ApiResponse)]
pub enum RunDailyResponse {
    #[oai(status = 200)]
    Ok(Json<RunDailyResponseDto>),
    #[oai(status = 500)]
    Error(Json<RunErrorDto>),
}

#[derive(Clone)]
pub struct DispatchEndpoints {
    state: Arc<ApiState>,
}

impl DispatchEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl DispatchEndpoints {
    #[oai(
        path = "/feedback/send-pending",
        method = "post",
        tag = EndpointsTags::Dispatch,
    )]
    pub async fn send_pending_feedback(
        &self,
        auth: SchedulerAuth,
    ) -> PoemResult<DispatchRunResponse> {
        auth.verify(&self.state.scheduler_secret)?;

        let settings = match self.state.settings_repo.load().await {
            Ok(settings) => settings,
            Err(err) => return Ok(run_error("feedback", err)),
        };
        let job = FeedbackDispatchJob::new(
            Arc::clone(&self.state.feedback_repo),
            settings,
            self.state.app_url.clone(),
            self.state.salon_name.clone(),
        );
        let dispatcher = BatchDispatcher::new(job, Arc::clone(&self.state.sms_gateway));

        match dispatcher.run(Utc::now()).await {
            Ok(summary) => Ok(DispatchRunResponse::Ok(Json(map_summary(&summary)))),
            Err(err) => Ok(run_error("feedback", err)),
        }
    }

    #[oai(
        path = "/winback/send-pending",
        method = "post",
        tag = EndpointsTags::Dispatch,
    )]
    pub async fn send_pending_winback(
        &self,
        auth: SchedulerAuth,
    ) -> PoemResult<DispatchRunResponse> {
        auth.verify(&self.state.scheduler_secret)?;

        let booking_url = personalizer::booking_url(&self.state.app_url);
        let job = WinbackDispatchJob::new(Arc::clone(&self.state.winback_repo), booking_url);
        let dispatcher = BatchDispatcher::new(job, Arc::clone(&self.state.sms_gateway));

        match dispatcher.run(Utc::now()).await {
            Ok(summary) => Ok(DispatchRunResponse::Ok(Json(map_summary(&summary)))),
            Err(err) => Ok(run_error("winback", err)),
        }
    }

    #[oai(
        path = "/cron/run-daily",
        method = "post",
        tag = EndpointsTags::Dispatch,
    )]
    pub async fn run_daily(&self, auth: SchedulerAuth) -> PoemResult<RunDailyResponse> {
        auth.verify(&self.state.scheduler_secret)?;

        let settings = match self.state.settings_repo.load().await {
            Ok(settings) => settings,
            Err(err) => {
                error!(job = "sweep", error = ?err, "dispatch run aborted");
                return Ok(RunDailyResponse::Error(Json(run_error_body(err))));
            }
        };

        match self
            .state
            .campaign_sweep_usecase
            .execute(Utc::now(), &settings)
            .await
        {
            Ok(results) => Ok(RunDailyResponse::Ok(Json(map_sweep_results(&results)))),
            Err(err) => {
                error!(job = "sweep", error = ?err, "dispatch run aborted");
                Ok(RunDailyResponse::Error(Json(run_error_body(err))))
            }
        }
    }
}

fn run_error(job: &str, err: anyhow::Error) -> DispatchRunResponse {
    error!(job, error = ?err, "dispatch run aborted");
    DispatchRunResponse::Error(Json(run_error_body(err)))
}

fn run_error_body(err: anyhow::Error) -> RunErrorDto {
    RunErrorDto {
        success: false,
        error: "Internal server error".to_string(),
        message: err.to_string(),
    }
}
