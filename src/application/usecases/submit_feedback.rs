use std::sync::Arc;

use chrono::Utc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::{
    application::services::classifier::IssueClassifier,
    domain::{
        errors::DomainError,
        models::{BusinessSettings, FeedbackRequest, NewIssue},
        repositories::{FeedbackRequestRepository, IssueRepository},
    },
};

pub struct SubmitFeedbackUseCase {
    feedback_repo: Arc<dyn FeedbackRequestRepository>,
    issue_repo: Arc<dyn IssueRepository>,
    classifier: Arc<dyn IssueClassifier>,
}

pub struct SubmitFeedbackRequest {
    pub request_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
}

impl SubmitFeedbackUseCase {
    pub fn new(
        feedback_repo: Arc<dyn FeedbackRequestRepository>,
        issue_repo: Arc<dyn IssueRepository>,
        classifier: Arc<dyn IssueClassifier>,
    ) -> Self {
        Self {
            feedback_repo,
            issue_repo,
            classifier,
        }
    }

    pub async fn execute(
        &self,
        request: SubmitFeedbackRequest,
        settings: &BusinessSettings,
    ) -> Result<FeedbackRequest, DomainError> {
        if !(1..=10).contains(&request.rating) {
            return Err(DomainError::Validation(
                "rating must be between 1 and 10".to_string(),
            ));
        }

        let existing = self
            .feedback_repo
            .get(request.request_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("feedback request".to_string()))?;

        if existing.has_response() {
            return Err(DomainError::Conflict(
                "feedback already completed".to_string(),
            ));
        }

        let updated = self
            .feedback_repo
            .record_response(
                request.request_id,
                request.rating,
                request.comment.clone(),
                Utc::now(),
            )
            .await?;

        // Low ratings with a comment go through the classification hook.
        // Fire-and-forget: a classifier outage must not fail the submission.
        if request.rating <= i32::from(settings.low_rating_threshold) {
            if let Some(comment) = request.comment.filter(|c| !c.trim().is_empty()) {
                self.spawn_classification(request.request_id, comment);
            }
        }

        Ok(updated)
    }

    fn spawn_classification(&self, request_id: Uuid, comment: String) {
        let classifier = Arc::clone(&self.classifier);
        let issue_repo = Arc::clone(&self.issue_repo);
        tokio::spawn(async move {
            match classifier.classify(&comment).await {
                Ok(classification) if classification.is_issue => {
                    let issue = NewIssue {
                        feedback_request_id: request_id,
                        severity: classification.severity,
                        category: classification.category,
                        summary: classification.summary,
                    };
                    if let Err(err) = issue_repo.create(issue).await {
                        error!(feedback = %request_id, error = ?err, "failed to file issue");
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(feedback = %request_id, error = ?err, "issue classification failed");
                }
            }
        });
    }
}
