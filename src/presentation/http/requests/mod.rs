use poem_openapi::Object;

#[derive(Object, Debug)]
#[oai(rename_all = "camelCase")]
pub struct SubmitFeedbackRequestDto {
    #[oai(validator(minimum(value = "1"), maximum(value = "10")))]
    pub rating: i32,
    #[oai(validator(max_length = 2000))]
    pub comment: Option<String>,
}

/// Partial settings update; omitted fields keep their stored value.
#[derive(Object, Debug, Default)]
#[oai(rename_all = "camelCase")]
pub struct UpdateSettingsRequestDto {
    pub feedback_delay_minutes: Option<u32>,
    #[oai(validator(maximum(value = "10")))]
    pub low_rating_threshold: Option<u8>,
    #[oai(validator(maximum(value = "10")))]
    pub promoter_threshold: Option<u8>,
    pub winback_inactive_days: Option<u32>,
    pub winback_cooldown_days: Option<u32>,
    pub google_review_url: Option<String>,
    pub yelp_review_url: Option<String>,
    pub average_ticket_price: Option<f64>,
}
