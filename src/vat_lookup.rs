/// VAT lookup run when an order's customer changes
///
/// When the selected customer's name is a 13-digit Thai TIN:
/// 1. Reuse an existing partner with that VAT number, if any
/// 2. Otherwise query the RD VAT registry
/// 3. Decode the SOAP envelope and its JSON payload
/// 4. Fill the partner from the registry record, or clear the selection with a warning
use crate::directory::PartnerDirectory;
use crate::errors::AppError;
use crate::models::{
    LookupOutcome, Partner, PartnerUpdate, RegistryLookupResult, SaleOrder, Warning,
};
use crate::rd_client::RdVatClient;
use std::sync::Arc;

/// Length of a Thai tax identification number.
pub const TIN_LENGTH: usize = 13;
/// Country code assigned to partners filled from the RD registry.
pub const THAI_COUNTRY_CODE: &str = "TH";

const PLACEHOLDER: &str = "-";
const STREET_KEYS: [&str; 4] = ["BuildingName", "FloorNumber", "VillageName", "RoomNumber"];
const STREET2_KEYS: [&str; 5] = ["HouseNumber", "MooNumber", "SoiName", "StreetName", "Thambol"];

pub const API_ERROR_TITLE: &str = "API Error";
pub const NOT_FOUND_TITLE: &str = "VAT Number Not Found";
pub const NOT_FOUND_MESSAGE: &str = "No customer found with the provided VAT number.";

/// True when `name` is exactly 13 ASCII digits.
pub fn is_vat_candidate(name: &str) -> bool {
    name.len() == TIN_LENGTH && name.bytes().all(|b| b.is_ascii_digit())
}

/// Joins the first values of `keys`, skipping absent, empty, and `"-"` entries.
pub fn join_address_parts(data: &RegistryLookupResult, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| data.first(key))
        .filter(|value| !value.is_empty() && value != PLACEHOLDER)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Maps a handler error onto the warning shown to the user.
pub fn warning_for_error(err: &AppError) -> Warning {
    let message = match err.root() {
        AppError::RegistryStatus(_) => "Failed to fetch data from the API.".to_string(),
        AppError::MissingServiceResult => "No valid data returned from the API.".to_string(),
        _ => format!("An error occurred while fetching data: {}", err),
    };
    Warning::new(API_ERROR_TITLE, message)
}

/// Runs the VAT lookup for partner changes on sales orders.
#[derive(Clone)]
pub struct VatLookupHandler {
    directory: Arc<dyn PartnerDirectory>,
    registry: RdVatClient,
}

impl VatLookupHandler {
    pub fn new(directory: Arc<dyn PartnerDirectory>, registry: RdVatClient) -> Self {
        Self {
            directory,
            registry,
        }
    }

    /// Decides what the order's customer becomes after a partner change.
    ///
    /// Never fails: every error is logged and turned into `LookupOutcome::Cleared`.
    pub async fn handle_partner_change(&self, order: &SaleOrder) -> LookupOutcome {
        let Some(partner) = order.partner.as_ref() else {
            return LookupOutcome::Unchanged;
        };
        if !is_vat_candidate(&partner.name) {
            return LookupOutcome::Unchanged;
        }

        match self.resolve(partner).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Error during VAT lookup for {}: {}", partner.name, e);
                LookupOutcome::Cleared(warning_for_error(&e))
            }
        }
    }

    async fn resolve(&self, partner: &Partner) -> Result<LookupOutcome, AppError> {
        let tin = partner.name.as_str();

        if let Some(existing) = self.directory.find_partner_by_vat(tin).await? {
            tracing::info!(
                "Partner {} already registered with VAT {}, reusing it",
                existing.id,
                tin
            );
            return Ok(LookupOutcome::Existing(existing));
        }

        let data = self.registry.lookup(tin).await?;

        let Some(update) = self.build_update(tin, &data).await? else {
            tracing::warn!("RD registry has no branch name for TIN {}", tin);
            return Ok(LookupOutcome::Cleared(Warning::new(
                NOT_FOUND_TITLE,
                NOT_FOUND_MESSAGE,
            )));
        };

        let mut updated = partner.clone();
        updated.apply(update);
        tracing::info!("✓ Partner {} filled from RD registry: {}", updated.id, updated.name);
        Ok(LookupOutcome::Updated(updated))
    }

    /// Builds the complete partner update, or `None` without a branch name.
    pub async fn build_update(
        &self,
        tin: &str,
        data: &RegistryLookupResult,
    ) -> Result<Option<PartnerUpdate>, AppError> {
        let Some(branch_name) = data.first("BranchName").filter(|b| !b.is_empty()) else {
            return Ok(None);
        };

        let state_id = match data.first("Province").filter(|p| !p.is_empty()) {
            Some(province) => {
                let region = self.directory.find_region_by_name(&province).await?;
                if region.is_none() {
                    tracing::warn!("No region named {:?}, leaving state unset", province);
                }
                region.map(|r| r.id)
            }
            None => None,
        };

        let country_id = self
            .directory
            .find_country_by_code(THAI_COUNTRY_CODE)
            .await?
            .map(|c| c.id);

        Ok(Some(PartnerUpdate {
            vat: data
                .first("NID")
                .filter(|nid| !nid.is_empty())
                .unwrap_or_else(|| tin.to_string()),
            name: branch_name,
            street: join_address_parts(data, &STREET_KEYS),
            street2: join_address_parts(data, &STREET2_KEYS),
            city: data.first("Amphur").unwrap_or_default(),
            zip: data.first("PostCode").unwrap_or_default(),
            state_id,
            country_id,
        }))
    }
}
