use finance_research_agents::{
    api::start_server,
    config::Config,
    llm::{ChatBackend, GeminiChat},
    providers::Providers,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = Config::from_env();

    let api_port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("API_PORT"))
        .unwrap_or_else(|_| "8080".to_string())
        .parse()?;

    info!("Financial Research Agents - API Server");
    info!("Port: {}", api_port);

    let gemini_api_key = config.gemini_api_key.clone().unwrap_or_else(|| {
        eprintln!("GEMINI_API_KEY not set in .env; chat requests will fail");
        String::new()
    });

    let backend: Arc<dyn ChatBackend> =
        Arc::new(GeminiChat::new(gemini_api_key, config.request_timeout)?);
    let providers = Providers::new(&config)?;

    start_server(backend, providers, api_port).await?;

    Ok(())
}
