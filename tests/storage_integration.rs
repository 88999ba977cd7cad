use partner_vat_lookup::directory::{PartnerDirectory, PgPartnerDirectory};
use partner_vat_lookup::models::{LookupOutcome, Partner, SaleOrder};
use partner_vat_lookup::rd_client::RdVatClient;
use partner_vat_lookup::vat_lookup::VatLookupHandler;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::sync::Arc;

/// Integration smoke test for the Postgres partner directory against ERP-shaped tables.
/// Marked ignored to avoid running against production by accident; set TEST_DATABASE_URL to run.
#[tokio::test]
#[ignore]
async fn pg_directory_reads_integer_id_tables_smoke_test() -> anyhow::Result<()> {
    let db_url = env::var("TEST_DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL to run this test"))?;

    // Single connection so the temp tables below shadow any real ones
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&db_url)
        .await?;

    for ddl in [
        "CREATE TEMP TABLE res_country (id serial PRIMARY KEY, code varchar(2))",
        "CREATE TEMP TABLE res_country_state (
            id serial PRIMARY KEY,
            country_id integer NOT NULL,
            name varchar NOT NULL,
            code varchar NOT NULL
        )",
        "CREATE TEMP TABLE res_partner (
            id serial PRIMARY KEY,
            name varchar,
            vat varchar,
            street varchar,
            street2 varchar,
            city varchar,
            zip varchar,
            state_id integer,
            country_id integer
        )",
        "INSERT INTO res_country (id, code) VALUES (217, 'TH')",
        "INSERT INTO res_country_state (id, country_id, name, code)
         VALUES (10, 217, 'กรุงเทพมหานคร', 'TH-10')",
        "INSERT INTO res_partner (id, name, vat, city, state_id, country_id)
         VALUES (42, 'Existing Co., Ltd.', '0994000165501', 'Khlong Toei', 10, 217)",
        "INSERT INTO res_partner (id, name, vat) VALUES (43, NULL, '0105551234567')",
    ] {
        sqlx::query(ddl).execute(&pool).await?;
    }

    let directory = PgPartnerDirectory::new(pool);

    let partner = directory
        .find_partner_by_vat("0994000165501")
        .await?
        .ok_or_else(|| anyhow::anyhow!("partner 42 not found"))?;
    assert_eq!(partner.id, 42);
    assert_eq!(partner.name, "Existing Co., Ltd.");
    assert_eq!(partner.state_id, Some(10));
    assert_eq!(partner.country_id, Some(217));

    // NULL name decodes as empty
    let unnamed = directory
        .find_partner_by_vat("0105551234567")
        .await?
        .ok_or_else(|| anyhow::anyhow!("partner 43 not found"))?;
    assert_eq!(unnamed.name, "");
    assert_eq!(unnamed.state_id, None);

    assert!(directory.find_partner_by_vat("0000000000000").await?.is_none());

    let region = directory.find_region_by_name("กรุงเทพมหานคร").await?;
    assert_eq!(region.map(|r| r.id), Some(10));
    assert!(directory.find_region_by_name("Atlantis").await?.is_none());

    let country = directory.find_country_by_code("TH").await?;
    assert_eq!(country.map(|c| c.id), Some(217));

    // Dedup hits the database, so the registry is never contacted
    let handler = VatLookupHandler::new(
        Arc::new(directory),
        RdVatClient::with_endpoint("http://127.0.0.1:9"),
    );
    let order = SaleOrder {
        id: Some(1),
        partner: Some(Partner {
            id: 7,
            name: "0994000165501".to_string(),
            ..Default::default()
        }),
    };
    match handler.handle_partner_change(&order).await {
        LookupOutcome::Existing(partner) => assert_eq!(partner.id, 42),
        other => anyhow::bail!("Expected existing partner, got {:?}", other),
    }

    Ok(())
}
