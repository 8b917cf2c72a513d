//! Core data models for the provider search engine.

pub mod coordinate;
pub mod provider;

pub use coordinate::{Coordinate, RadiusCircle};
pub use provider::{ProviderField, ProviderRecord};
