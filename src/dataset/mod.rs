//! Provider dataset loading.
//!
//! The provider table is read once at startup from CSV (plain or `.gz`) and
//! never changes afterwards. Rows with unusable coordinates are skipped with
//! a warning; a missing column or unreadable file fails the load.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::filter::FilterOptions;
use crate::models::{Coordinate, ProviderRecord};

/// Columns every provider file must carry.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "ProviderID",
    "VendorID",
    "PCNID",
    "ProviderName",
    "Address",
    "County",
    "Market",
    "Specialty",
    "City",
    "Language",
    "Latitude",
    "Longitude",
];

#[derive(Debug, Error, PartialEq)]
pub enum RowError {
    #[error("{column} is not a number: '{value}'")]
    NotANumber { column: &'static str, value: String },
    #[error("coordinate ({lat}, {lon}) is out of range")]
    OutOfRange { lat: f64, lon: f64 },
}

/// Raw CSV row. Identifiers stay textual; coordinates are validated separately.
#[derive(Debug, Deserialize)]
struct RawProviderRow {
    #[serde(rename = "ProviderID")]
    provider_id: String,
    #[serde(rename = "VendorID")]
    vendor_id: String,
    #[serde(rename = "PCNID")]
    pcn_id: String,
    #[serde(rename = "ProviderName")]
    provider_name: String,
    #[serde(rename = "Address")]
    address: String,
    #[serde(rename = "County")]
    county: String,
    #[serde(rename = "Market")]
    market: String,
    #[serde(rename = "Specialty")]
    specialty: String,
    #[serde(rename = "City")]
    city: String,
    #[serde(rename = "Language")]
    language: String,
    #[serde(rename = "Latitude")]
    latitude: String,
    #[serde(rename = "Longitude")]
    longitude: String,
}

impl TryFrom<RawProviderRow> for ProviderRecord {
    type Error = RowError;

    fn try_from(row: RawProviderRow) -> Result<Self, Self::Error> {
        let latitude = parse_degrees("Latitude", &row.latitude)?;
        let longitude = parse_degrees("Longitude", &row.longitude)?;
        if !Coordinate::new(latitude, longitude).is_valid() {
            return Err(RowError::OutOfRange {
                lat: latitude,
                lon: longitude,
            });
        }

        Ok(ProviderRecord {
            provider_id: row.provider_id,
            vendor_id: row.vendor_id,
            pcn_id: row.pcn_id,
            provider_name: row.provider_name,
            address: row.address,
            county: row.county,
            market: row.market,
            specialty: row.specialty,
            city: row.city,
            language: row.language,
            latitude,
            longitude,
        })
    }
}

fn parse_degrees(column: &'static str, value: &str) -> Result<f64, RowError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| RowError::NotANumber {
            column,
            value: value.to_string(),
        })
}

/// The immutable provider set plus values derived from it once at load.
#[derive(Debug, Clone, Default)]
pub struct ProviderDataset {
    records: Vec<ProviderRecord>,
    options: FilterOptions,
    centroid: Option<Coordinate>,
}

impl ProviderDataset {
    pub fn from_records(records: Vec<ProviderRecord>) -> Self {
        let options = FilterOptions::collect(&records);
        let centroid = mean_center(&records);
        Self {
            records,
            options,
            centroid,
        }
    }

    /// Load a provider CSV, transparently decompressing `.gz` files
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading providers from {}", path.display());

        let file = File::open(path)
            .with_context(|| format!("Failed to open provider file: {}", path.display()))?;
        let reader: Box<dyn Read> = if path.extension().is_some_and(|e| e == "gz") {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };

        let dataset = Self::from_reader(reader)
            .with_context(|| format!("Failed to read provider file: {}", path.display()))?;
        info!("Loaded {} providers", dataset.len());
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == *column) {
                anyhow::bail!("Column '{}' not found", column);
            }
        }

        let mut records = Vec::new();
        let mut rejected = 0usize;
        for (index, result) in csv_reader.deserialize::<RawProviderRow>().enumerate() {
            // Header is line 1
            let line = index + 2;
            let row = match result {
                Ok(row) => row,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    warn!("Skipping provider row at line {}: {}", line, e);
                    rejected += 1;
                    continue;
                }
            };
            match ProviderRecord::try_from(row) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("Skipping provider row at line {}: {}", line, e);
                    rejected += 1;
                }
            }
        }

        if rejected > 0 {
            warn!("Rejected {} malformed provider rows", rejected);
        }

        Ok(Self::from_records(records))
    }

    pub fn records(&self) -> &[ProviderRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct sorted values per filterable field
    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Mean position of every provider, `None` for an empty dataset
    pub fn centroid(&self) -> Option<Coordinate> {
        self.centroid
    }
}

/// Arithmetic mean of provider positions. Good enough for centering a map.
pub fn mean_center<'a, I>(records: I) -> Option<Coordinate>
where
    I: IntoIterator<Item = &'a ProviderRecord>,
{
    let (count, lat_sum, lon_sum) = records
        .into_iter()
        .fold((0usize, 0.0f64, 0.0f64), |(n, lat, lon), r| {
            (n + 1, lat + r.latitude, lon + r.longitude)
        });
    (count > 0).then(|| Coordinate::new(lat_sum / count as f64, lon_sum / count as f64))
}
