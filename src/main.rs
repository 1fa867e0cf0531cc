use actix_web::{middleware, web, App, HttpServer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repoflow::handlers::{github_webhook, health_check, AppState};
use repoflow::services::webhook::WebhookValidator;
use repoflow::Config;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "repoflow=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    info!("Starting repoflow webhook server on {}:{}", config.host, config.port);

    let validator = WebhookValidator::new(config.webhook_secret.clone().into_bytes());
    let state = web::Data::new(AppState { validator });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .route("/health", web::get().to(health_check))
            .route("/webhooks/github", web::post().to(github_webhook))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
