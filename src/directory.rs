//! Partner directory capability and its implementations.

use crate::errors::{AppError, ResultExt};
use crate::models::{Country, Partner, Region};
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Lookups the VAT handler needs from the contact directory.
#[async_trait]
pub trait PartnerDirectory: Send + Sync {
    /// First partner whose `vat` equals `vat`.
    async fn find_partner_by_vat(&self, vat: &str) -> Result<Option<Partner>, AppError>;

    /// First region whose name equals `name` exactly.
    async fn find_region_by_name(&self, name: &str) -> Result<Option<Region>, AppError>;

    /// Country with ISO code `code`.
    async fn find_country_by_code(&self, code: &str) -> Result<Option<Country>, AppError>;
}

/// Directory backed by the ERP's Postgres tables.
pub struct PgPartnerDirectory {
    pool: PgPool,
}

impl PgPartnerDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool against `database_url` and checks it answers.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl PartnerDirectory for PgPartnerDirectory {
    async fn find_partner_by_vat(&self, vat: &str) -> Result<Option<Partner>, AppError> {
        sqlx::query_as::<_, Partner>(
            // ERP ids and many2one columns are INT4; name may be NULL
            "SELECT id::int8 AS id, COALESCE(name, '') AS name, vat, street, street2,
                    city, zip, state_id::int8 AS state_id, country_id::int8 AS country_id
             FROM res_partner
             WHERE vat = $1
             ORDER BY id
             LIMIT 1",
        )
        .bind(vat)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("partner search by VAT {}", vat))
    }

    async fn find_region_by_name(&self, name: &str) -> Result<Option<Region>, AppError> {
        sqlx::query_as::<_, Region>(
            "SELECT id::int8 AS id, name, code
             FROM res_country_state
             WHERE name = $1
             ORDER BY id
             LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("region search by name {}", name))
    }

    async fn find_country_by_code(&self, code: &str) -> Result<Option<Country>, AppError> {
        sqlx::query_as::<_, Country>(
            "SELECT id::int8 AS id, code FROM res_country WHERE code = $1 ORDER BY id LIMIT 1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("country search by code {}", code))
    }
}

/// Fixed in-memory directory, for tests and local runs without a database.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPartnerDirectory {
    partners: Vec<Partner>,
    regions: Vec<Region>,
    countries: Vec<Country>,
}

impl InMemoryPartnerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_partner(mut self, partner: Partner) -> Self {
        self.partners.push(partner);
        self
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.regions.push(region);
        self
    }

    pub fn with_country(mut self, country: Country) -> Self {
        self.countries.push(country);
        self
    }
}

#[async_trait]
impl PartnerDirectory for InMemoryPartnerDirectory {
    async fn find_partner_by_vat(&self, vat: &str) -> Result<Option<Partner>, AppError> {
        Ok(self
            .partners
            .iter()
            .find(|p| p.vat.as_deref() == Some(vat))
            .cloned())
    }

    async fn find_region_by_name(&self, name: &str) -> Result<Option<Region>, AppError> {
        Ok(self.regions.iter().find(|r| r.name == name).cloned())
    }

    async fn find_country_by_code(&self, code: &str) -> Result<Option<Country>, AppError> {
        Ok(self.countries.iter().find(|c| c.code == code).cloned())
    }
}
