use partner_vat_lookup::config::Config;
use partner_vat_lookup::directory::PgPartnerDirectory;
use partner_vat_lookup::handlers::{self, AppState};
use partner_vat_lookup::rd_client::RdVatClient;
use partner_vat_lookup::vat_lookup::VatLookupHandler;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration, connects the partner directory,
/// wires the VAT lookup handler and serves the HTTP API.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "partner_vat_lookup=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let directory = PgPartnerDirectory::connect(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    let registry = RdVatClient::new(&config);
    tracing::info!("✓ RD registry client initialized: {}", registry.endpoint());

    let app_state = Arc::new(AppState {
        vat_lookup: VatLookupHandler::new(Arc::new(directory), registry.clone()),
        registry,
    });

    let app = handlers::router(app_state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
