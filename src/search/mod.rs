//! Search orchestration.
//!
//! Two query modes run over the shared, read-only provider dataset:
//!
//! - attribute search: the filter pipeline over every provider, dataset order;
//! - radius search: geocode the address through the cache, keep providers
//!   inside any radius band, then narrow by attributes, nearest first.
//!
//! Radius membership is decided before attribute filtering, so attribute
//! filters only narrow the geofenced set. Nothing in here returns an error:
//! an unusable query yields an empty or unrestricted result instead.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::dataset::{mean_center, ProviderDataset};
use crate::filter::AttributeFilter;
use crate::geocode::{AddressComponents, GeocodeCache};
use crate::models::{Coordinate, ProviderRecord, RadiusCircle};
use crate::radius::{self, RankedProvider, Thresholds};

/// Address + radius query
#[derive(Debug, Clone, Default)]
pub struct RadiusSearchRequest {
    pub address: AddressComponents,
    pub thresholds: Thresholds,
    pub filter: AttributeFilter,
}

/// Query descriptor for [`SearchService::search`]
#[derive(Debug, Clone)]
pub enum SearchQuery {
    Attribute(AttributeFilter),
    Radius(RadiusSearchRequest),
}

/// Ranked providers plus the geometry a map renderer needs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResult<'a> {
    pub providers: Vec<RankedProvider<'a>>,
    /// One circle per radius band; empty for attribute search
    pub circles: Vec<RadiusCircle>,
    /// Suggested map center
    pub center: Option<Coordinate>,
    /// Geocoded search origin, for radius searches that resolved
    pub origin: Option<Coordinate>,
}

impl SearchResult<'_> {
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &ProviderRecord> + '_ {
        self.providers.iter().map(|p| p.record)
    }
}

pub struct SearchService {
    dataset: Arc<ProviderDataset>,
    geocoder: GeocodeCache,
}

impl SearchService {
    pub fn new(dataset: Arc<ProviderDataset>, geocoder: GeocodeCache) -> Self {
        Self { dataset, geocoder }
    }

    pub fn dataset(&self) -> &ProviderDataset {
        &self.dataset
    }

    pub fn geocode_cache(&self) -> &GeocodeCache {
        &self.geocoder
    }

    pub async fn search(&self, query: &SearchQuery) -> SearchResult<'_> {
        match query {
            SearchQuery::Attribute(filter) => self.attribute_search(filter),
            SearchQuery::Radius(request) => self.radius_search(request).await,
        }
    }

    /// Filter the whole dataset by attributes. No distances are computed.
    pub fn attribute_search(&self, filter: &AttributeFilter) -> SearchResult<'_> {
        let providers: Vec<RankedProvider<'_>> = filter
            .apply(self.dataset.records())
            .into_iter()
            .map(|record| RankedProvider {
                record,
                distance: None,
            })
            .collect();

        debug!(
            "Attribute search kept {} of {} providers",
            providers.len(),
            self.dataset.len()
        );

        let center = mean_center(providers.iter().map(|p| p.record)).or(self.dataset.centroid());
        SearchResult {
            providers,
            circles: Vec::new(),
            center,
            origin: None,
        }
    }

    /// Geocode, geofence, then filter by attributes, nearest first.
    ///
    /// A blank address or failed geocode gives an empty result. A request
    /// with no usable radius falls back to attribute search.
    pub async fn radius_search(&self, request: &RadiusSearchRequest) -> SearchResult<'_> {
        if request.address.is_blank() {
            debug!("Radius search without an address, returning no providers");
            return self.empty_result();
        }

        if request.thresholds.is_empty() {
            debug!("Radius search without a usable radius, falling back to attribute search");
            return self.attribute_search(&request.filter);
        }

        let Some(origin) = self.geocoder.resolve(&request.address).await else {
            info!(
                "Could not geocode '{}', returning no providers",
                request.address.normalized_key()
            );
            return self.empty_result();
        };

        let candidates: Vec<&ProviderRecord> = self.dataset.records().iter().collect();
        let mut evaluation = radius::evaluate(&candidates, Some(origin), &request.thresholds);
        let in_radius = evaluation.ranked.len();

        // retain() keeps relative order, so the distance ranking survives
        evaluation
            .ranked
            .retain(|ranked| request.filter.matches(ranked.record));

        info!(
            "Radius search at ({:.5}, {:.5}) up to {} mi: {} in radius, {} after filters",
            origin.lat,
            origin.lon,
            request.thresholds.max().unwrap_or_default(),
            in_radius,
            evaluation.ranked.len()
        );

        SearchResult {
            providers: evaluation.ranked,
            circles: evaluation.circles,
            center: Some(origin),
            origin: Some(origin),
        }
    }

    fn empty_result(&self) -> SearchResult<'_> {
        SearchResult {
            center: self.dataset.centroid(),
            ..SearchResult::default()
        }
    }
}
