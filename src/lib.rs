//! Partner VAT Lookup Library
//!
//! Fills sales-order customers from the Thai Revenue Department VAT registry
//! when the customer name is a 13-digit tax identification number, reusing an
//! existing partner with the same VAT number when there is one.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `directory`: Partner directory capability (Postgres and in-memory).
//! - `errors`: Error handling types.
//! - `handlers`: HTTP router and request handlers.
//! - `models`: Partner, order, registry and outcome models.
//! - `rd_client`: RD VAT registry SOAP client.
//! - `vat_lookup`: Partner-change VAT lookup workflow.

pub mod config;
pub mod directory;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod rd_client;
pub mod vat_lookup;
