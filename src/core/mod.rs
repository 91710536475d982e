//! Core business logic - framework-agnostic inventory, ledger and workflow operations.

/// Relative "last updated" phrases
pub mod age;
/// Food categories and the item catalog
pub mod catalog;
/// Issue reports for kaitiaki
pub mod issue;
/// Normalization of loosely-typed ledger rows from external sources
pub mod ingest;
/// Ledger aggregation into per-pātaka stock
pub mod inventory;
/// Location lookups, addresses and distances
pub mod location;
/// Cupboard listings for clients
pub mod report;
/// Donation and collection posting
pub mod transaction;
/// Donate, take and report wizards
pub mod workflow;
