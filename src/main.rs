use paypalctl::{ApiClient, ClientConfig, ClientBuilder};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("paypalctl=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "unable to obtain an access token");
            ExitCode::FAILURE
        }
    }
}

/// Pre-fetches a token with credentials from the environment and reports on
/// it. The token itself is never printed.
async fn run() -> paypalctl::Result<()> {
    let config = ClientConfig::from_env()?;
    let environment = config.environment;
    let client: ApiClient = ClientBuilder::new(config).build()?;

    let token = client.access_token().await?;
    println!("environment: {environment}");
    println!("token type:  {}", token.token_type);
    println!("expires at:  {}", paypalctl::codec::timestamp::format(&token.expires_at));
    if let Some(scope) = &token.scope {
        println!("scopes:");
        for scope in scope.split_whitespace() {
            println!("  {scope}");
        }
    }
    Ok(())
}
