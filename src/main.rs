use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use image_variation_web::{config::Config, gemini::GeminiClient, studio, web_pages};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let generator = GeminiClient::builder()
        .api_key(config.api_key.clone())
        .model(config.model.clone())
        .base_url(config.base_url.clone())
        .build();
    if !generator.has_credential() {
        tracing::warn!("API_KEY is not set; every generation attempt will fail until it is");
    }

    let studio = studio::spawn(Arc::new(generator));
    let router = web_pages::router(studio, config.max_upload_bytes);
    let tcp_listener = tokio::net::TcpListener::bind(&config.bind_address).await?;

    tracing::info!(
        model = %config.model,
        "Image variation studio started at http://{}",
        config.bind_address
    );

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
