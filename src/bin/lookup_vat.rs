//! Utility to query the RD VAT registry for one TIN and print the decoded record.

use partner_vat_lookup::config::Config;
use partner_vat_lookup::rd_client::RdVatClient;
use partner_vat_lookup::vat_lookup::is_vat_candidate;
use std::env;

/// Main entry point for the lookup utility.
///
/// Usage: `lookup_vat <13-digit TIN>`. Honors `RD_SERVICE_URL`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "partner_vat_lookup=info".into()),
        )
        .init();

    let tin = env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: lookup_vat <13-digit TIN>"))?;
    if !is_vat_candidate(&tin) {
        anyhow::bail!("TIN must be exactly 13 digits, got {:?}", tin);
    }

    let client = RdVatClient::with_endpoint(Config::rd_service_url_from_env()?);
    let record = client.lookup(&tin).await?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
