//! Reference set of developed countries.
//!
//! Names follow WHO country naming so they match the `COUNTRY` / `country`
//! columns of the WHO datasets verbatim.

use std::collections::BTreeSet;

use crate::models::DevelopmentStatus;

/// Countries classified as developed.
pub const DEVELOPED_COUNTRIES: [&str; 36] = [
    "Australia",
    "Austria",
    "Belgium",
    "Canada",
    "Croatia",
    "Czechia",
    "Denmark",
    "Estonia",
    "Finland",
    "France",
    "Germany",
    "Greece",
    "Hungary",
    "Iceland",
    "Ireland",
    "Israel",
    "Italy",
    "Japan",
    "Latvia",
    "Lithuania",
    "Luxembourg",
    "Malta",
    "Netherlands (Kingdom of the)",
    "New Zealand",
    "Norway",
    "Poland",
    "Portugal",
    "Republic of Korea",
    "Singapore",
    "Slovakia",
    "Slovenia",
    "Spain",
    "Sweden",
    "Switzerland",
    "United Kingdom of Great Britain and Northern Ireland",
    "United States of America",
];

/// Immutable set of developed-country names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryReference {
    developed: BTreeSet<String>,
}

impl CountryReference {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            developed: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The compiled-in list.
    pub fn who_developed() -> Self {
        Self::new(DEVELOPED_COUNTRIES)
    }

    pub fn status_of(&self, country: &str) -> DevelopmentStatus {
        if self.developed.contains(country) {
            DevelopmentStatus::Developed
        } else {
            DevelopmentStatus::Developing
        }
    }

    pub fn len(&self) -> usize {
        self.developed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.developed.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.developed.iter().map(String::as_str)
    }
}

impl Default for CountryReference {
    fn default() -> Self {
        Self::who_developed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_list_has_no_duplicates() {
        assert_eq!(CountryReference::who_developed().len(), DEVELOPED_COUNTRIES.len());
    }

    #[test]
    fn test_status_is_exact_match() {
        let reference = CountryReference::new(["Japan"]);
        assert_eq!(reference.status_of("Japan"), DevelopmentStatus::Developed);
        assert_eq!(reference.status_of("japan"), DevelopmentStatus::Developing);
        assert_eq!(reference.status_of("Kenya"), DevelopmentStatus::Developing);
    }
}
