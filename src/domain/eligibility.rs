//! Send-time eligibility rules.
//!
//! Opt-in status and campaign activation can change between intent creation
//! and the scheduled run, so every rule is re-evaluated here at send time.
//! Rules are checked in order and the first failing rule wins.

use crate::domain::models::{Customer, FailureReason, WinbackCampaign};

/// Winback: campaign must still be active, the recipient must still be
/// opted in, and there must be a usable destination number.
pub fn check_winback(
    campaign: &WinbackCampaign,
    customer: &Customer,
) -> Result<(), FailureReason> {
    if !campaign.active {
        return Err(FailureReason::CampaignInactive);
    }
    if !customer.marketing_opt_in {
        return Err(FailureReason::OptedOut);
    }
    if !customer.has_destination() {
        return Err(FailureReason::NoDestination);
    }
    Ok(())
}

/// Feedback requests follow a direct service interaction, so they are not
/// opt-in gated; only a usable destination is required.
pub fn check_feedback(customer: &Customer) -> Result<(), FailureReason> {
    if !customer.has_destination() {
        return Err(FailureReason::NoDestination);
    }
    Ok(())
}
