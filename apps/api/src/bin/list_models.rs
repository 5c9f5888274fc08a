//! Prints the Gemini models available to `GEMINI_API_KEY`, marking those that support
//! `generateContent`.

use anyhow::Result;

use analyzer_api::config::Config;
use analyzer_api::llm_client::{LlmClient, MODEL};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    let client = LlmClient::new(config.gemini_api_key).with_base_url(config.gemini_api_url);

    let models = client.list_models().await?;
    println!("Available Gemini models ({}):", models.len());
    for model in &models {
        let generates = model
            .supported_generation_methods
            .iter()
            .any(|m| m == "generateContent");
        let current = model.name.trim_start_matches("models/") == MODEL;
        println!(
            "{} {:<40} {}{}",
            if generates { "*" } else { " " },
            model.name,
            model.display_name.as_deref().unwrap_or(""),
            if current { "  (in use)" } else { "" }
        );
    }

    Ok(())
}
