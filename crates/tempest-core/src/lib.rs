//! Core decoding and derivation logic for WeatherFlow UDP telemetry
//!
//! This crate is host-agnostic: it turns raw datagrams into typed
//! observations, addresses them, and computes derived meteorological
//! quantities. Persistence and transport live in sibling crates.

pub mod decode;
pub mod derive;
pub mod identity;
pub mod schema;
pub mod types;

pub use decode::{decode, DecodeError};
pub use types::{Observation, RawValue, StatePath};
