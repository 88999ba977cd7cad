/// Default endpoint of the RD VAT registry SOAP service.
pub const DEFAULT_RD_SERVICE_URL: &str = "https://rdws.rd.go.th/jsonRD/vatserviceRD3.asmx";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rd_service_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DB_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DB_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DB_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            rd_service_url: Self::rd_service_url_from_env()?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Database host: {}", database_host(&config.database_url));
        tracing::debug!("RD service URL: {}", config.rd_service_url);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Reads `RD_SERVICE_URL`, falling back to the public RD endpoint.
    ///
    /// Shared with the `lookup_vat` binary, which needs no database.
    pub fn rd_service_url_from_env() -> anyhow::Result<String> {
        let raw = std::env::var("RD_SERVICE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_RD_SERVICE_URL.to_string());

        validate_service_url(&raw)?;
        Ok(raw)
    }
}

/// Host part of a database URL, for logging without credentials.
fn database_host(database_url: &str) -> String {
    url::Url::parse(database_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "<unparsable>".to_string())
}

fn validate_service_url(raw: &str) -> anyhow::Result<()> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| anyhow::anyhow!("RD_SERVICE_URL is not a valid URL: {}", e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("RD_SERVICE_URL must start with http:// or https://");
    }
    Ok(())
}
