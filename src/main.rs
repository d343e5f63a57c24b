use clap::Parser;
use dotenvy::dotenv;
use filebox_server::config::AppConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::parse();

    if let Err(e) = filebox_server::serve(config).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
