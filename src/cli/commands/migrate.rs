use serde_json::json;

use crate::cli::utils::{connect, output_success};
use crate::cli::OutputFormat;
use crate::database::{DatabaseManager, MIGRATOR};

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = connect().await?;
    DatabaseManager::migrate(&pool).await?;

    let versions: Vec<i64> = MIGRATOR.iter().map(|m| m.version).collect();
    output_success(
        output_format,
        &format!("Database schema is up to date ({} migrations)", versions.len()),
        Some(json!({ "migrations": versions })),
    )
}
