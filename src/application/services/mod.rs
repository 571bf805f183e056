pub mod classifier;
pub mod personalizer;
pub mod sms;
