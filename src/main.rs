use clap::Parser;
use tracing_subscriber::EnvFilter;

use newsdesk_api::cli::{self, utils::output_error, Cli, OutputFormat};

#[tokio::main]
async fn main() {
    // Load .env if present so DATABASE_URL, JWT_SECRET etc. are picked up locally
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("newsdesk_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let output_format = OutputFormat::from_cli(&cli);

    if let Err(e) = cli::run(cli).await {
        let _ = output_error(output_format, &format!("{:#}", e));
        std::process::exit(1);
    }
}
