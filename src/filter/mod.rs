//! Attribute filter pipeline.
//!
//! Narrows a provider set by exact, case-sensitive membership of each
//! categorical field in an accepted-value set. Fields without a selection
//! (or with an empty one) impose no constraint, so the empty filter is the
//! identity.

use hashbrown::{HashMap, HashSet};
use serde::Serialize;

use crate::models::{ProviderField, ProviderRecord};

/// Accepted values for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldSelection {
    /// No restriction
    #[default]
    Unset,
    /// Keep records whose value is one of these
    Set(HashSet<String>),
}

impl FieldSelection {
    /// Build a selection from raw values. No values means no restriction.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: HashSet<String> = values.into_iter().map(Into::into).collect();
        if set.is_empty() {
            FieldSelection::Unset
        } else {
            FieldSelection::Set(set)
        }
    }

    /// True when this selection rejects nothing.
    pub fn is_unrestricted(&self) -> bool {
        match self {
            FieldSelection::Unset => true,
            FieldSelection::Set(values) => values.is_empty(),
        }
    }

    pub fn accepts(&self, value: &str) -> bool {
        match self {
            FieldSelection::Unset => true,
            FieldSelection::Set(values) => values.is_empty() || values.contains(value),
        }
    }
}

/// Per-field selections over the five filterable provider attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeFilter {
    selections: HashMap<ProviderField, FieldSelection>,
}

impl AttributeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter, replacing any prior selection for the field.
    pub fn with<I, S>(mut self, field: ProviderField, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(field, FieldSelection::from_values(values));
        self
    }

    pub fn set(&mut self, field: ProviderField, selection: FieldSelection) {
        if selection.is_unrestricted() {
            self.selections.remove(&field);
        } else {
            self.selections.insert(field, selection);
        }
    }

    pub fn get(&self, field: ProviderField) -> &FieldSelection {
        const UNSET: &FieldSelection = &FieldSelection::Unset;
        self.selections.get(&field).unwrap_or(UNSET)
    }

    /// True when no field constrains the result.
    pub fn is_empty(&self) -> bool {
        self.selections.values().all(FieldSelection::is_unrestricted)
    }

    /// Check one record against every active selection.
    pub fn matches(&self, record: &ProviderRecord) -> bool {
        self.selections
            .iter()
            .all(|(field, selection)| selection.accepts(record.field(*field)))
    }

    /// Keep the records that pass, preserving their relative order.
    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a ProviderRecord>
    where
        I: IntoIterator<Item = &'a ProviderRecord>,
    {
        if self.is_empty() {
            return records.into_iter().collect();
        }
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// Distinct, sorted values of every filterable field across a dataset.
///
/// These are the option lists a renderer offers for each filter.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterOptions {
    pub county: Vec<String>,
    pub market: Vec<String>,
    pub specialty: Vec<String>,
    pub city: Vec<String>,
    pub language: Vec<String>,
}

impl FilterOptions {
    pub fn collect<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ProviderRecord>,
    {
        let mut seen: HashMap<ProviderField, HashSet<&'a str>> = HashMap::new();
        for record in records {
            for field in ProviderField::all() {
                seen.entry(*field).or_default().insert(record.field(*field));
            }
        }

        let mut sorted = |field: ProviderField| -> Vec<String> {
            let mut values: Vec<String> = seen
                .remove(&field)
                .unwrap_or_default()
                .into_iter()
                .map(String::from)
                .collect();
            values.sort();
            values
        };

        Self {
            county: sorted(ProviderField::County),
            market: sorted(ProviderField::Market),
            specialty: sorted(ProviderField::Specialty),
            city: sorted(ProviderField::City),
            language: sorted(ProviderField::Language),
        }
    }

    pub fn values(&self, field: ProviderField) -> &[String] {
        match field {
            ProviderField::County => &self.county,
            ProviderField::Market => &self.market,
            ProviderField::Specialty => &self.specialty,
            ProviderField::City => &self.city,
            ProviderField::Language => &self.language,
        }
    }
}
