//! Query-string parameters and their conversion into search requests.

use serde::Deserialize;

use geoaccess::geocode::AddressComponents;
use geoaccess::radius::Thresholds;
use geoaccess::{AttributeFilter, FieldSelection, ProviderField, RadiusSearchRequest};

/// Attribute search. Each field takes a comma-separated list of accepted values.
#[derive(Debug, Default, Deserialize)]
pub struct ProviderQueryParams {
    pub county: Option<String>,
    pub market: Option<String>,
    pub specialty: Option<String>,
    pub city: Option<String>,
    pub language: Option<String>,
}

impl ProviderQueryParams {
    pub fn to_filter(&self) -> AttributeFilter {
        build_filter([
            (ProviderField::County, &self.county),
            (ProviderField::Market, &self.market),
            (ProviderField::Specialty, &self.specialty),
            (ProviderField::City, &self.city),
            (ProviderField::Language, &self.language),
        ])
    }
}

/// Address + radius search.
///
/// `city` belongs to the address being geocoded; the provider City filter
/// is `filter_city`.
#[derive(Debug, Default, Deserialize)]
pub struct RadiusQueryParams {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    /// Comma-separated radii in miles, e.g. "5,10"
    pub radius: Option<String>,
    pub county: Option<String>,
    pub market: Option<String>,
    pub specialty: Option<String>,
    pub filter_city: Option<String>,
    pub language: Option<String>,
}

impl RadiusQueryParams {
    pub fn to_request(&self) -> RadiusSearchRequest {
        RadiusSearchRequest {
            address: AddressComponents {
                street: self.street.clone(),
                city: self.city.clone(),
                state: self.state.clone(),
                zip: self.zip.clone(),
            },
            thresholds: Thresholds::parse(self.radius.as_deref().unwrap_or_default().split(',')),
            filter: build_filter([
                (ProviderField::County, &self.county),
                (ProviderField::Market, &self.market),
                (ProviderField::Specialty, &self.specialty),
                (ProviderField::City, &self.filter_city),
                (ProviderField::Language, &self.language),
            ]),
        }
    }
}

fn build_filter<'a>(fields: [(ProviderField, &'a Option<String>); 5]) -> AttributeFilter {
    let mut filter = AttributeFilter::new();
    for (field, raw) in fields {
        filter.set(field, FieldSelection::from_values(split_list(raw)));
    }
    filter
}

/// Split "a,b" into items. Whitespace around separators is dropped, as are
/// empty items.
fn split_list(raw: &Option<String>) -> Vec<String> {
    raw.as_deref()
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(&Some("Dallas, Tarrant,,".into())),
            vec!["Dallas", "Tarrant"]
        );
        assert!(split_list(&Some(" , ".into())).is_empty());
        assert!(split_list(&None).is_empty());
    }

    #[test]
    fn test_provider_params_to_filter() {
        let params = ProviderQueryParams {
            county: Some("Dallas,Collin".into()),
            language: Some("".into()),
            ..Default::default()
        };
        let filter = params.to_filter();
        assert!(!filter.is_empty());
        assert!(matches!(filter.get(ProviderField::County), FieldSelection::Set(v) if v.len() == 2));
        assert_eq!(filter.get(ProviderField::Language), &FieldSelection::Unset);
        assert!(ProviderQueryParams::default().to_filter().is_empty());
    }

    #[test]
    fn test_radius_params_to_request() {
        let params = RadiusQueryParams {
            street: Some("1 Main St".into()),
            city: Some("Dallas".into()),
            state: Some("TX".into()),
            radius: Some("5, ten,10".into()),
            filter_city: Some("Irving".into()),
            ..Default::default()
        };
        let request = params.to_request();
        assert_eq!(request.address.normalized_key(), "1 Main St, Dallas, TX");
        assert_eq!(request.thresholds.as_slice(), &[5.0, 10.0]);
        assert!(matches!(
            request.filter.get(ProviderField::City),
            FieldSelection::Set(v) if v.contains("Irving")
        ));
    }

    #[test]
    fn test_missing_radius_is_empty() {
        let request = RadiusQueryParams::default().to_request();
        assert!(request.thresholds.is_empty());
        assert!(request.address.is_blank());
    }
}
