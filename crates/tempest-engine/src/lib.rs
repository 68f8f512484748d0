//! Stateful half of the pipeline: rolling time buckets, daily extrema, and
//! the per-packet processor that ties decoding, derivation and aggregation
//! together against a state store.

pub mod buckets;
pub mod minmax;
pub mod processor;

pub use processor::{Engine, EngineConfig};

use tempest_core::decode::DecodeError;
use tempest_store::StoreError;
use thiserror::Error;

/// Whole-packet failures. Everything here is recoverable: the caller logs
/// it and waits for the next datagram.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    #[error("observation carries no serial number; its fields cannot be addressed")]
    Unaddressable,

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ProcessResult<T> = Result<T, ProcessError>;
