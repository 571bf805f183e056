pub mod ai;
pub mod repositories;
pub mod sms;
