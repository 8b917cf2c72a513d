//! TTL-bounded memoization of geocoder lookups.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use hashbrown::HashMap;
use tracing::{debug, info, warn};

use super::{AddressComponents, Clock, GeocodeError, Geocoder, SystemClock};
use crate::models::Coordinate;

/// How long a resolution (hit or miss) stays authoritative.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Upper bound on a single resolver call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    /// `None` records a failed or empty resolution
    value: Option<Coordinate>,
    created_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) >= ttl
    }
}

/// Memoizing front for a [`Geocoder`].
///
/// Entries are keyed by [`AddressComponents::normalized_key`]. The map lock
/// is never held across the resolver call, so two concurrent misses for the
/// same key may both reach the resolver; the later write replaces the
/// earlier one wholesale.
pub struct GeocodeCache {
    geocoder: Arc<dyn Geocoder>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    timeout: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl GeocodeCache {
    /// Cache with the wall clock, one-hour TTL and default resolver timeout
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self::with_clock(geocoder, Arc::new(SystemClock), DEFAULT_TTL)
    }

    pub fn with_clock(geocoder: Arc<dyn Geocoder>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            geocoder,
            clock,
            ttl,
            timeout: DEFAULT_TIMEOUT,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve address parts to a coordinate.
    ///
    /// Blank input returns `None` without touching the resolver. Resolver
    /// failures are logged, cached as `None` for the TTL and returned as `None`.
    pub async fn resolve(&self, address: &AddressComponents) -> Option<Coordinate> {
        let key = address.normalized_key();
        if key.is_empty() {
            debug!("Skipping geocode for blank address");
            return None;
        }
        self.resolve_key(&key).await
    }

    async fn resolve_key(&self, key: &str) -> Option<Coordinate> {
        if let Some(entry) = self.lookup(key) {
            debug!("Geocode cache hit for '{}'", key);
            return entry.value;
        }

        info!("Geocode cache miss for '{}', querying resolver", key);
        let value = match self.call_resolver(key).await {
            Ok(Some(coord)) if coord.is_valid() => Some(coord),
            Ok(Some(coord)) => {
                warn!(
                    "Geocoder returned out-of-range coordinate ({}, {}) for '{}'",
                    coord.lat, coord.lon, key
                );
                None
            }
            Ok(None) => {
                debug!("Geocoder found no match for '{}'", key);
                None
            }
            Err(e) => {
                warn!("Geocoding '{}' failed: {}", key, e);
                None
            }
        };

        self.store(key, value);
        value
    }

    async fn call_resolver(&self, key: &str) -> Result<Option<Coordinate>, GeocodeError> {
        tokio::time::timeout(self.timeout, self.geocoder.geocode(key))
            .await
            .map_err(|_| GeocodeError::Timeout(self.timeout))?
    }

    fn lookup(&self, key: &str) -> Option<CacheEntry> {
        let now = self.clock.now();
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|entry| !entry.is_expired(now, self.ttl))
            .copied()
    }

    fn store(&self, key: &str, value: Option<Coordinate>) {
        let entry = CacheEntry {
            value,
            created_at: self.clock.now(),
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), entry);
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired entries. Lookups already ignore them; this only reclaims memory.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now, self.ttl));
        let purged = before - entries.len();
        if purged > 0 {
            debug!("Purged {} expired geocode entries", purged);
        }
        purged
    }
}
