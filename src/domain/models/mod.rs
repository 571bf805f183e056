pub mod campaign;
pub mod customer;
pub mod issue;
pub mod message;
pub mod settings;

pub use campaign::WinbackCampaign;
pub use customer::{Customer, CustomerLastVisit};
pub use issue::{Issue, IssueStatus, NewIssue};
pub use message::{
    FailureReason, FeedbackCandidate, FeedbackRequest, IntentStatus, WinbackCandidate,
    WinbackMessage,
};
pub use settings::BusinessSettings;
