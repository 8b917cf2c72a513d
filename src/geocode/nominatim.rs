//! Nominatim (OpenStreetMap) forward geocoder.

use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{GeocodeError, Geocoder};
use crate::models::Coordinate;

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_USER_AGENT: &str = "geoaccess_tool";

/// One element of the `/search?format=json` array. Coordinates arrive as strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// HTTP client for a Nominatim-compatible `/search` endpoint
#[derive(Clone)]
pub struct NominatimGeocoder {
    client: Client,
    search_url: Url,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut base = Url::parse(base_url)?;
        // Without a trailing slash, join() would replace the last path segment
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let search_url = base.join("search")?;
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, search_url })
    }

    async fn search(&self, address: &str) -> Result<Option<Coordinate>, GeocodeError> {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("q", address)
            .append_pair("format", "json")
            .append_pair("limit", "1");

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status()));
        }

        let body = response.bytes().await?;
        let places: Vec<NominatimPlace> = serde_json::from_slice(&body)
            .map_err(|e| GeocodeError::Malformed(e.to_string()))?;
        debug!("Nominatim returned {} candidates for '{}'", places.len(), address);

        places.first().map(parse_place).transpose()
    }
}

fn parse_place(place: &NominatimPlace) -> Result<Coordinate, GeocodeError> {
    let lat = place
        .lat
        .trim()
        .parse::<f64>()
        .map_err(|_| GeocodeError::Malformed(format!("bad latitude '{}'", place.lat)))?;
    let lon = place
        .lon
        .trim()
        .parse::<f64>()
        .map_err(|_| GeocodeError::Malformed(format!("bad longitude '{}'", place.lon)))?;
    Ok(Coordinate::new(lat, lon))
}

impl Geocoder for NominatimGeocoder {
    fn geocode<'a>(
        &'a self,
        address: &'a str,
    ) -> BoxFuture<'a, Result<Option<Coordinate>, GeocodeError>> {
        self.search(address).boxed()
    }
}
