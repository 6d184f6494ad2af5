use vapi_todo_core::auth::TOKEN_ENV;
use vapi_todo_core::{Config, TokenStore};

/// Run the credential flow to completion so `serve` starts without a browser.
pub async fn run(print_env: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let tokens = TokenStore::from_config(&config, reqwest::Client::new())?;
    let credential = tokens.obtain().await?;

    eprintln!(
        "Google Calendar authorized, token cached at {}",
        tokens.sources().token_file.display()
    );
    if print_env {
        println!("{TOKEN_ENV}={}", credential.encode()?);
    }
    Ok(())
}
