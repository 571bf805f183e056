pub mod eligibility;
pub mod errors;
pub mod models;
pub mod repositories;
