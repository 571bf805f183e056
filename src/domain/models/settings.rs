use serde::{Deserialize, Serialize};

/// Business rules the salon owner can adjust at runtime. Loaded once at the
/// top of each dispatch run and passed down as a snapshot, so the due-window
/// and eligibility logic stays a pure function of (record, now, settings).
///
/// `#[serde(default)]` merges stored values with defaults, so fields added
/// after a settings record was written still come back populated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BusinessSettings {
    /// Minutes to wait after checkout before a feedback request is due.
    pub feedback_delay_minutes: u32,
    /// Ratings at or below this open an issue for follow-up.
    pub low_rating_threshold: u8,
    /// Ratings at or above this get a review link.
    pub promoter_threshold: u8,
    /// Days since last visit before a customer counts as inactive.
    pub winback_inactive_days: u32,
    /// Minimum days between winback messages to the same customer.
    pub winback_cooldown_days: u32,
    pub google_review_url: String,
    pub yelp_review_url: String,
    /// Rough average ticket price for ROI estimates.
    pub average_ticket_price: f64,
}

impl Default for BusinessSettings {
    fn default() -> Self {
        Self {
            feedback_delay_minutes: 30,
            low_rating_threshold: 6,
            promoter_threshold: 9,
            winback_inactive_days: 60,
            winback_cooldown_days: 30,
            google_review_url: "https://g.page/r/YOUR_GOOGLE_PLACE_ID/review".to_string(),
            yelp_review_url: "https://www.yelp.com/writeareview/biz/YOUR_YELP_BIZ_ID".to_string(),
            average_ticket_price: 50.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let stored = serde_json::json!({ "feedback_delay_minutes": 45 });
        let settings: BusinessSettings = serde_json::from_value(stored).unwrap();
        assert_eq!(settings.feedback_delay_minutes, 45);
        assert_eq!(settings.low_rating_threshold, 6);
        assert_eq!(settings.winback_cooldown_days, 30);
    }
}
