use serde::{Deserialize, Serialize};

/// Free-text address parts as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressComponents {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
}

impl AddressComponents {
    pub fn new(street: &str, city: &str, state: &str, zip: &str) -> Self {
        Self {
            street: Some(street.to_string()),
            city: Some(city.to_string()),
            state: Some(state.to_string()),
            zip: Some(zip.to_string()),
        }
    }

    /// Cache key and resolver query: trimmed parts, blanks dropped, joined with ", ".
    pub fn normalized_key(&self) -> String {
        [&self.street, &self.city, &self.state, &self.zip]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn is_blank(&self) -> bool {
        self.normalized_key().is_empty()
    }
}
