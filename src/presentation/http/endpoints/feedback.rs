use std::sync::Arc;

use poem::Result as PoemResult;
use poem_openapi::{OpenApi, param::Path, payload::Json};
use uuid::Uuid;

use crate::{
    application::usecases::submit_feedback::SubmitFeedbackRequest,
    domain::errors::DomainError,
    presentation::http::{
        endpoints::root::{ApiState, EndpointsTags},
        requests::SubmitFeedbackRequestDto,
        responses::SubmitFeedbackResponseDto,
    },
};

#[derive(Clone)]
pub struct FeedbackEndpoints {
    state: Arc<ApiState>,
}

impl FeedbackEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl FeedbackEndpoints {
    /// Public endpoint behind the unguessable link sent by SMS; the request
    /// id is the only credential.
    #[oai(
        path = "/feedback/:request_id/submit",
        method = "post",
        tag = EndpointsTags::Feedback,
    )]
    pub async fn submit_feedback(
        &self,
        request_id: Path<Uuid>,
        request: Json<SubmitFeedbackRequestDto>,
    ) -> PoemResult<Json<SubmitFeedbackResponseDto>> {
        let settings = self
            .state
            .settings_repo
            .load()
            .await
            .map_err(internal_error)?;

        let updated = self
            .state
            .submit_feedback_usecase
            .execute(
                SubmitFeedbackRequest {
                    request_id: request_id.0,
                    rating: request.rating,
                    comment: request.comment.clone(),
                },
                &settings,
            )
            .await
            .map_err(domain_error)?;

        Ok(Json(SubmitFeedbackResponseDto {
            success: true,
            request_id: updated.id,
            rating: request.rating,
            responded_at: updated
                .responded_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
        }))
    }
}

fn domain_error(err: DomainError) -> poem::Error {
    let status = match &err {
        DomainError::NotFound(_) => poem::http::StatusCode::NOT_FOUND,
        DomainError::Validation(_) => poem::http::StatusCode::BAD_REQUEST,
        // A second submission is a client error, same as a bad rating.
        DomainError::Conflict(_) => poem::http::StatusCode::BAD_REQUEST,
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
