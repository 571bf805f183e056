use std::env::var;

use dotenvy::dotenv;

pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub app_url: String,
    pub salon_name: String,
    pub scheduler_secret: String,
    pub twilio: TwilioConfig,
    pub ai_worker_url: String,
}

#[derive(Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

impl Config {
    pub fn try_parse() -> Result<Config, &'static str> {
        let _ = dotenv();

        Ok(Config {
            port: var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| "An error occured while parsing PORT env param")?,
            database_url: var("DATABASE_URL")
                .map_err(|_| "An error occured while getting DATABASE_URL env param")?,
            app_url: var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            salon_name: var("SALON_NAME").unwrap_or_else(|_| "G Nail Pines".to_string()),
            scheduler_secret: var("SCHEDULER_SECRET")
                .map_err(|_| "An error occured while getting SCHEDULER_SECRET env param")?,
            twilio: TwilioConfig {
                account_sid: var("TWILIO_ACCOUNT_SID")
                    .map_err(|_| "An error occured while getting TWILIO_ACCOUNT_SID env param")?,
                auth_token: var("TWILIO_AUTH_TOKEN")
                    .map_err(|_| "An error occured while getting TWILIO_AUTH_TOKEN env param")?,
                from_number: var("TWILIO_FROM_NUMBER")
                    .map_err(|_| "An error occured while getting TWILIO_FROM_NUMBER env param")?,
            },
            ai_worker_url: var("AI_WORKER_URL")
                .unwrap_or_else(|_| "http://localhost:8787".to_string()),
        })
    }
}
