//! Address resolution.
//!
//! The external resolver sits behind the [`Geocoder`] trait. [`GeocodeCache`]
//! memoizes it per normalized address for a fixed TTL, caching failures as
//! well as hits, and never lets a resolver error escape.

mod address;
mod cache;
pub mod clock;
mod nominatim;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::models::Coordinate;

pub use address::AddressComponents;
pub use cache::{GeocodeCache, DEFAULT_TTL};
pub use clock::{Clock, ManualClock, SystemClock};
pub use nominatim::{NominatimGeocoder, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};

/// Why a resolver call did not produce an answer.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoder request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("geocoder returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed geocoder response: {0}")]
    Malformed(String),
    #[error("geocoder timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// External address-resolution capability.
///
/// `Ok(None)` means the resolver answered but found nothing.
pub trait Geocoder: Send + Sync {
    fn geocode<'a>(
        &'a self,
        address: &'a str,
    ) -> BoxFuture<'a, Result<Option<Coordinate>, GeocodeError>>;
}
