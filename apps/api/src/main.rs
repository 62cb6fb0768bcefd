//! Motionwatch API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod state;

use motionwatch_core::AppError;
use tracing::info;

use crate::api_config::{ApiCommand, ApiConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let http_client = api_services::build_http_client()?;

    if config.command == ApiCommand::ListModels {
        return list_models(&config, http_client).await;
    }

    let prompt_template = api_services::load_prompt_template(&config).await?;
    let app_state = api_services::build_app_state(&config, http_client, prompt_template);
    let app = api_router::build_router(app_state);

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "motionwatch-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

async fn list_models(config: &ApiConfig, http_client: reqwest::Client) -> Result<(), AppError> {
    let analyzer = api_services::build_gemini_analyzer(config, http_client, String::new());
    let models = analyzer.list_models().await?;

    println!("Available Gemini models:\n");
    for model in models {
        println!("{}", model.name);
        println!("  Display name: {}", model.display_name);
        println!(
            "  Methods: {}\n",
            model.supported_generation_methods.join(", ")
        );
    }

    Ok(())
}
