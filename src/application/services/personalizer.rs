//! Message body rendering. Deterministic string work only; length and
//! encoding limits are the transport's concern.

use uuid::Uuid;

const FIRST_NAME_TOKEN: &str = "{{firstName}}";
const BOOKING_LINK_TOKEN: &str = "{{bookingLink}}";

pub fn feedback_url(app_url: &str, request_id: Uuid) -> String {
    format!("{}/feedback/{}", app_url.trim_end_matches('/'), request_id)
}

pub fn booking_url(app_url: &str) -> String {
    format!("{}/book", app_url.trim_end_matches('/'))
}

/// Fixed feedback-request template. A missing first name falls back to a
/// generic greeting instead of producing "Hi , ...".
pub fn render_feedback(
    first_name: Option<&str>,
    salon_name: &str,
    feedback_url: &str,
) -> String {
    let greeting = greeting(first_name);
    format!(
        "{greeting}! Thank you for visiting {salon_name}. We'd love to hear about your \
         experience today. Please take a moment to share your feedback: {feedback_url}"
    )
}

/// Campaign-supplied template with `{{firstName}}` and `{{bookingLink}}`
/// tokens substituted by find-and-replace.
pub fn render_winback(template: &str, first_name: Option<&str>, booking_url: &str) -> String {
    template
        .replace(FIRST_NAME_TOKEN, first_name.unwrap_or("there"))
        .replace(BOOKING_LINK_TOKEN, booking_url)
}

fn greeting(first_name: Option<&str>) -> String {
    match first_name {
        Some(name) if !name.trim().is_empty() => format!("Hi {name}"),
        _ => "Hi there".to_string(),
    }
}
