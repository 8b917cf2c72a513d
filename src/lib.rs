//! GeoAccess - provider filtering and geo-radius search
//!
//! This library provides the search engine shared by the query server:
//! attribute filtering, cached geocoding, and geodesic radius ranking over an
//! in-memory provider dataset.

pub mod config;
pub mod dataset;
pub mod filter;
pub mod geocode;
pub mod models;
pub mod radius;
pub mod search;

pub use dataset::ProviderDataset;
pub use filter::{AttributeFilter, FieldSelection};
pub use models::{Coordinate, ProviderField, ProviderRecord, RadiusCircle};
pub use search::{RadiusSearchRequest, SearchQuery, SearchResult, SearchService};
