//! Error taxonomy for the estimation engine
//!
//! Two failure classes with different blast radii: a `ProviderError`
//! aborts the current recompute cycle (the previously published snapshot
//! stays up), while a `ParseError` only drops the offending record and
//! lets the surrounding batch continue.

use thiserror::Error;

/// Failure of an external data source
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network or service failure, including per-call timeouts.
    /// Aborts the current cycle only; no internal retry.
    #[error("transient provider failure: {0}")]
    Transient(String),

    /// Missing credentials or configuration for one source.
    /// Fatal for that source's startup; other sources may still succeed.
    #[error("provider configuration error: {0}")]
    Config(String),
}

/// Per-record failure; the record is dropped and counted, never fatal
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid numeric {field}: {value:?}")]
    InvalidNumber {
        field: &'static str,
        value: String,
    },

    #[error("malformed catalog payload: {0}")]
    MalformedPayload(String),

    #[error("catalog payload carries no usable on-demand offer")]
    MissingOffer,

    /// Weighted capacity denominator is zero (vcpu = 0 and memory = 0),
    /// which would otherwise put a non-finite unit price on the record
    #[error("catalog entry reports zero priced capacity")]
    EmptyCapacity,

    /// An on-demand price of zero makes discount and capacity undefined
    #[error("on-demand reference price is zero")]
    ZeroReferencePrice,
}
