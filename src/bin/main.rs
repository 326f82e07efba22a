use finance_research_agents::{
    config::Config,
    driver::{Driver, StdinSource},
    llm::{ChatBackend, GeminiChat, ScriptedBackend},
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

    let backend: Arc<dyn ChatBackend> = match &config.gemini_api_key {
        Some(key) => Arc::new(GeminiChat::new(key.clone(), config.request_timeout)?),
        None => {
            eprintln!("GEMINI_API_KEY not set; running with a scripted backend");
            Arc::new(ScriptedBackend::new([
                "concierge",
                "Hello! Set GEMINI_API_KEY to talk to the real assistant.",
            ]))
        }
    };

    let providers = Providers::new(&config)?;
    let mut driver = Driver::new(backend, &providers);

    info!("Financial research assistant starting");

    let mut input = StdinSource::new();
    driver
        .run(&mut input, |reply| println!("{}", reply))
        .await?;

    Ok(())
}
