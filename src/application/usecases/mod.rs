pub mod run_campaign_sweep;
pub mod send_pending_feedback;
pub mod send_pending_winback;
pub mod submit_feedback;
pub mod update_settings;
