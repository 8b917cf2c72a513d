//! Provider rows and their filterable attributes.

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Categorical provider attributes that can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ProviderField {
    County,
    Market,
    Specialty,
    City,
    Language,
}

impl ProviderField {
    /// Get all filterable fields in display order
    pub fn all() -> &'static [ProviderField] {
        &[
            ProviderField::County,
            ProviderField::Market,
            ProviderField::Specialty,
            ProviderField::City,
            ProviderField::Language,
        ]
    }

    /// Column name in the provider CSV
    pub fn column_name(&self) -> &'static str {
        match self {
            ProviderField::County => "County",
            ProviderField::Market => "Market",
            ProviderField::Specialty => "Specialty",
            ProviderField::City => "City",
            ProviderField::Language => "Language",
        }
    }
}

impl std::fmt::Display for ProviderField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

/// One provider row. Immutable once loaded.
///
/// Serialized with the same column names the CSV uses, so a renderer can
/// treat the JSON records exactly like the source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRecord {
    #[serde(rename = "ProviderID")]
    pub provider_id: String,
    #[serde(rename = "VendorID")]
    pub vendor_id: String,
    #[serde(rename = "PCNID")]
    pub pcn_id: String,
    #[serde(rename = "ProviderName")]
    pub provider_name: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "County")]
    pub county: String,
    #[serde(rename = "Market")]
    pub market: String,
    #[serde(rename = "Specialty")]
    pub specialty: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Language")]
    pub language: String,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
}

impl ProviderRecord {
    /// Value of a filterable attribute
    pub fn field(&self, field: ProviderField) -> &str {
        match field {
            ProviderField::County => &self.county,
            ProviderField::Market => &self.market,
            ProviderField::Specialty => &self.specialty,
            ProviderField::City => &self.city,
            ProviderField::Language => &self.language,
        }
    }

    pub fn location(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}
