use std::sync::Arc;

use poem::{Route, Server, listener::TcpListener};
use poem_openapi::OpenApiService;
use sqlx::postgres::PgPoolOptions;
use tokio::main;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    application::usecases::{
        run_campaign_sweep::RunCampaignSweepUseCase, submit_feedback::SubmitFeedbackUseCase,
        update_settings::UpdateSettingsUseCase,
    },
    config::Config,
    infrastructure::{
        ai::worker::AiWorkerClassifier,
        repositories::postgres::{
            PostgresCampaignRepository, PostgresCustomerRepository,
            PostgresFeedbackRequestRepository, PostgresIssueRepository,
            PostgresSettingsRepository, PostgresWinbackMessageRepository,
        },
        sms::twilio::TwilioSmsGateway,
    },
    presentation::http::endpoints::{
        dispatch::DispatchEndpoints,
        feedback::FeedbackEndpoints,
        root::{ApiState, Endpoints},
        settings::SettingsEndpoints,
    },
};

mod application;
mod config;
mod domain;
mod infrastructure;
mod presentation;

#[main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::try_parse().map_err(anyhow::Error::msg)?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!().run(&pool).await?;

    let feedback_repo = PostgresFeedbackRequestRepository::new(pool.clone());
    let winback_repo = PostgresWinbackMessageRepository::new(pool.clone());
    let campaign_repo = PostgresCampaignRepository::new(pool.clone());
    let customer_repo = PostgresCustomerRepository::new(pool.clone());
    let issue_repo = PostgresIssueRepository::new(pool.clone());
    let settings_repo = PostgresSettingsRepository::new(pool);

    let sms_gateway = TwilioSmsGateway::new(config.twilio.clone());
    let classifier = AiWorkerClassifier::new(config.ai_worker_url.clone());

    let state = Arc::new(ApiState {
        feedback_repo: feedback_repo.clone(),
        winback_repo: winback_repo.clone(),
        settings_repo: settings_repo.clone(),
        sms_gateway,
        submit_feedback_usecase: Arc::new(SubmitFeedbackUseCase::new(
            feedback_repo,
            issue_repo,
            classifier,
        )),
        campaign_sweep_usecase: Arc::new(RunCampaignSweepUseCase::new(
            campaign_repo,
            customer_repo,
            winback_repo,
        )),
        update_settings_usecase: Arc::new(UpdateSettingsUseCase::new(settings_repo)),
        app_url: config.app_url.clone(),
        salon_name: config.salon_name.clone(),
        scheduler_secret: config.scheduler_secret.clone(),
    });

    let server_url = format!("http://localhost:{}", config.port);
    info!(%server_url, "starting server");

    let api_service = OpenApiService::new(
        (
            Endpoints,
            DispatchEndpoints::new(Arc::clone(&state)),
            FeedbackEndpoints::new(Arc::clone(&state)),
            SettingsEndpoints::new(state),
        ),
        "Salon Growth API",
        "0.1.0",
    )
    .server(format!("{server_url}/api"));
    let ui = api_service.swagger_ui();
    let app = Route::new().nest("/api", api_service).nest("/", ui);

    Server::new(TcpListener::bind(format!("0.0.0.0:{}", config.port)))
        .run(app)
        .await?;
    Ok(())
}
