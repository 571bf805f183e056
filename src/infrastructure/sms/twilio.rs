use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    application::services::sms::{DeliveryError, SmsGateway},
    config::TwilioConfig,
};

pub struct TwilioSmsGateway {
    http: Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl TwilioSmsGateway {
    pub fn new(config: TwilioConfig) -> Arc<dyn SmsGateway> {
        Arc::new(Self {
            http: Client::builder()
                .user_agent("salon-growth/twilio")
                .build()
                .expect("failed to build twilio client"),
            base_url: "https://api.twilio.com".to_string(),
            account_sid: config.account_sid,
            auth_token: config.auth_token,
            from_number: config.from_number,
        }) as Arc<dyn SmsGateway>
    }
}

#[async_trait]
impl SmsGateway for TwilioSmsGateway {
    async fn send(&self, destination: &str, body: &str) -> Result<String, DeliveryError> {
        let to = format_phone_e164(destination);
        if !is_valid_e164(&to) {
            return Err(DeliveryError::InvalidDestination(destination.to_string()));
        }

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );
        let params = [
            ("To", to.as_str()),
            ("From", self.from_number.as_str()),
            ("Body", body),
        ];

        let response = self
            .http
            .post(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error: TwilioErrorResponse = response.json().await.unwrap_or_default();
            return Err(DeliveryError::Provider {
                status: status.as_u16(),
                message: error
                    .message
                    .unwrap_or_else(|| "unknown provider error".to_string()),
            });
        }

        let payload: TwilioMessageResponse = response
            .json()
            .await
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;
        Ok(payload.sid)
    }
}

/// Normalizes a stored phone number to E.164. US numbers without a
/// country code get a `+1` prefix; numbers already carrying `+` pass
/// through unchanged.
pub fn format_phone_e164(phone: &str) -> String {
    let trimmed = phone.trim();
    if trimmed.starts_with('+') {
        return trimmed.to_string();
    }

    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 10 {
        format!("+1{digits}")
    } else if digits.len() == 11 && digits.starts_with('1') {
        format!("+{digits}")
    } else {
        format!("+{digits}")
    }
}

fn is_valid_e164(phone: &str) -> bool {
    let Some(digits) = phone.strip_prefix('+') else {
        return false;
    };
    (10..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

#[derive(Debug, Deserialize)]
struct TwilioMessageResponse {
    sid: String,
}

#[derive(Debug, Default, Deserialize)]
struct TwilioErrorResponse {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_digit_numbers_get_a_us_country_code() {
        assert_eq!(format_phone_e164("9135550001"), "+19135550001");
        assert_eq!(format_phone_e164("(913) 555-0001"), "+19135550001");
    }

    #[test]
    fn eleven_digit_numbers_starting_with_one_get_a_plus() {
        assert_eq!(format_phone_e164("19135550001"), "+19135550001");
    }

    #[test]
    fn numbers_with_a_plus_pass_through() {
        assert_eq!(format_phone_e164("+442071838750"), "+442071838750");
    }

    #[test]
    fn e164_validation_bounds() {
        assert!(is_valid_e164("+19135550001"));
        assert!(is_valid_e164("+442071838750"));
        assert!(!is_valid_e164("9135550001"));
        assert!(!is_valid_e164("+123"));
        assert!(!is_valid_e164("+1913555000a"));
    }
}
