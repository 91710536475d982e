//! Unified error types for the pātaka inventory service.
//!
//! Every fallible operation in the crate returns [`Result`]. Only
//! [`Error::LocationNotFound`] is meant to reach callers as a "not found"
//! response; the remaining variants describe rejected input or storage failures.

use thiserror::Error;

/// Errors produced by configuration, ledger and workflow operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested pātaka does not exist or has been soft-deleted
    #[error("Pātaka {id} not found")]
    LocationNotFound {
        /// Identifier that was looked up
        id: i64,
    },

    /// A quantity outside the accepted range was supplied
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity {
        /// The rejected quantity
        quantity: i64,
    },

    /// A stored ledger row carries a type code that is neither donation nor collection
    #[error("Unknown transaction type code: {code}")]
    UnknownTransactionType {
        /// The stored code
        code: i64,
    },

    /// A donation or collection carried no usable items
    #[error("Submission contains no valid items")]
    EmptySubmission,

    /// A collection asked for more than the ledger says is on the shelf
    #[error("Not enough '{item}' available: {available} on hand, {requested} requested")]
    InsufficientStock {
        /// Display name of the item
        item: String,
        /// Ledger-derived quantity currently available
        available: i64,
        /// Quantity the collection asked for
        requested: i64,
    },

    /// An issue report had neither a description nor a photo
    #[error("An issue report needs a description or a photo")]
    IncompleteReport,

    /// A reporter email address is not shaped like one
    #[error("Invalid email address: {email}")]
    InvalidEmail {
        /// The rejected address
        email: String,
    },

    /// Scanned QR text does not name a pātaka
    #[error("Unrecognised QR code: {text}")]
    InvalidQrCode {
        /// The scanned text, trimmed
        text: String,
    },

    /// A workflow step was attempted from a state that does not allow it
    #[error("Cannot {action} while workflow is {from}")]
    InvalidTransition {
        /// Name of the state the workflow was in
        from: &'static str,
        /// Name of the attempted transition
        action: &'static str,
    },

    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description
        message: String,
    },

    /// Storage layer failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// JSON encoding or decoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error should be reported to an HTTP caller as 404.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::LocationNotFound { .. })
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
