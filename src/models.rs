use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

// ============ Directory Models ============

/// A contact record (`res_partner`) that can be selected as an order's customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Partner {
    /// Unique identifier of the partner.
    pub id: i64,
    /// Display name. Holds the raw TIN until a registry match renames it.
    pub name: String,
    /// Tax identification number.
    #[serde(default)]
    pub vat: Option<String>,
    /// Street line 1.
    #[serde(default)]
    pub street: Option<String>,
    /// Street line 2.
    #[serde(default)]
    pub street2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    /// Postal code.
    #[serde(default)]
    pub zip: Option<String>,
    /// Region (`res_country_state`) reference.
    #[serde(default)]
    pub state_id: Option<i64>,
    /// Country (`res_country`) reference.
    #[serde(default)]
    pub country_id: Option<i64>,
}

impl Partner {
    /// Writes every field of `update` onto the partner in one step.
    pub fn apply(&mut self, update: PartnerUpdate) {
        let PartnerUpdate {
            vat,
            name,
            street,
            street2,
            city,
            zip,
            state_id,
            country_id,
        } = update;

        self.vat = Some(vat);
        self.name = name;
        self.street = Some(street);
        self.street2 = Some(street2);
        self.city = Some(city);
        self.zip = Some(zip);
        self.state_id = state_id;
        self.country_id = country_id;
    }
}

/// A region / province (`res_country_state`).
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Region {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
}

/// A country (`res_country`).
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Country {
    pub id: i64,
    pub code: String,
}

/// Sales order as seen by the partner-change hook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleOrder {
    #[serde(default)]
    pub id: Option<i64>,
    /// Customer reference; `None` means no customer is selected.
    #[serde(default)]
    pub partner: Option<Partner>,
}

/// Complete set of values written to a partner after a registry match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerUpdate {
    pub vat: String,
    pub name: String,
    pub street: String,
    pub street2: String,
    pub city: String,
    pub zip: String,
    pub state_id: Option<i64>,
    pub country_id: Option<i64>,
}

// ============ RD Registry Models ============

/// Decoded `ServiceResult` payload: field name -> array of candidate values.
///
/// The registry wraps every field in an array; only the first element is used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistryLookupResult {
    pub fields: Map<String, Value>,
}

impl RegistryLookupResult {
    /// First value of `key` as text.
    ///
    /// Missing keys, empty arrays, `null`, and non-array values yield `None`.
    pub fn first(&self, key: &str) -> Option<String> {
        match self.fields.get(key)?.as_array()?.first()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

// ============ Handler Outcome ============

/// User-facing warning attached to a rejected partner change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub title: String,
    pub message: String,
}

impl Warning {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Result of running the VAT lookup against an order's customer reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Customer name is not a TIN candidate; nothing to do.
    Unchanged,
    /// A partner with the same TIN already exists and replaces the selection.
    Existing(Partner),
    /// The selected partner, updated with registry data.
    Updated(Partner),
    /// Selection cleared; the warning explains why.
    Cleared(Warning),
}

impl LookupOutcome {
    /// Writes the outcome to `order`, returning the warning to show, if any.
    pub fn apply_to(self, order: &mut SaleOrder) -> Option<Warning> {
        match self {
            LookupOutcome::Unchanged => None,
            LookupOutcome::Existing(partner) | LookupOutcome::Updated(partner) => {
                order.partner = Some(partner);
                None
            }
            LookupOutcome::Cleared(warning) => {
                order.partner = None;
                Some(warning)
            }
        }
    }

    pub fn warning(&self) -> Option<&Warning> {
        match self {
            LookupOutcome::Cleared(warning) => Some(warning),
            _ => None,
        }
    }
}

// ============ HTTP Models ============

/// Body of `POST /api/v1/sale-orders/onchange-partner`.
#[derive(Debug, Clone, Deserialize)]
pub struct PartnerChangeRequest {
    #[serde(default)]
    pub order_id: Option<i64>,
    #[serde(default)]
    pub partner: Option<Partner>,
}

/// Response of the partner-change endpoint, shaped like an ERP onchange result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerChangeResponse {
    pub order_id: Option<i64>,
    pub partner: Option<Partner>,
    pub warning: Option<Warning>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_value_handling() {
        let result: RegistryLookupResult = serde_json::from_value(json!({
            "BranchName": ["ABC CO., LTD."],
            "PostCode": [10110],
            "Empty": [],
            "Null": [null],
            "Scalar": "not-an-array"
        }))
        .unwrap();

        assert_eq!(result.first("BranchName").as_deref(), Some("ABC CO., LTD."));
        assert_eq!(result.first("PostCode").as_deref(), Some("10110"));
        assert_eq!(result.first("Empty"), None);
        assert_eq!(result.first("Null"), None);
        assert_eq!(result.first("Scalar"), None);
        assert_eq!(result.first("Missing"), None);
    }

    #[test]
    fn test_apply_to_order() {
        let partner = Partner {
            id: 7,
            name: "Existing".to_string(),
            ..Default::default()
        };
        let mut order = SaleOrder::default();

        let warning = LookupOutcome::Existing(partner.clone()).apply_to(&mut order);
        assert!(warning.is_none());
        assert_eq!(order.partner.as_ref(), Some(&partner));

        let warning = LookupOutcome::Cleared(Warning::new("API Error", "boom")).apply_to(&mut order);
        assert_eq!(warning.map(|w| w.title), Some("API Error".to_string()));
        assert!(order.partner.is_none());
    }

    #[test]
    fn test_apply_overwrites_every_field() {
        let mut partner = Partner {
            id: 1,
            name: "0105551234567".to_string(),
            state_id: Some(99),
            ..Default::default()
        };

        partner.apply(PartnerUpdate {
            vat: "0105551234567".to_string(),
            name: "ABC".to_string(),
            street: "Tower A".to_string(),
            street2: "99 Sukhumvit".to_string(),
            city: "Khlong Toei".to_string(),
            zip: "10110".to_string(),
            state_id: None,
            country_id: Some(217),
        });

        assert_eq!(partner.id, 1);
        assert_eq!(partner.name, "ABC");
        assert_eq!(partner.vat.as_deref(), Some("0105551234567"));
        assert_eq!(partner.state_id, None);
        assert_eq!(partner.country_id, Some(217));
    }
}
