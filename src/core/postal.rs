use crate::domain::model::{CountryCode, ResolvedPoint};
use crate::domain::ports::PostalLookup;
use crate::utils::error::RowError;
use std::collections::BTreeSet;

pub const DEFAULT_COUNTRIES: [&str; 4] = ["CH", "LI", "AT", "DE"];

/// Allowed country codes for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountrySet {
    codes: BTreeSet<CountryCode>,
}

impl CountrySet {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            codes: codes
                .into_iter()
                .map(|c| CountryCode::normalized(c.as_ref()))
                .filter(|c| !c.as_str().is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, code: &CountryCode) -> bool {
        self.codes.contains(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CountryCode> {
        self.codes.iter()
    }

    /// Sorted, comma separated.
    pub fn describe(&self) -> String {
        self.codes
            .iter()
            .map(CountryCode::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for CountrySet {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTRIES)
    }
}

pub struct PostalResolver<L: PostalLookup> {
    countries: CountrySet,
    lookup: L,
}

impl<L: PostalLookup> PostalResolver<L> {
    pub fn new(countries: CountrySet, lookup: L) -> Self {
        Self { countries, lookup }
    }

    pub fn countries(&self) -> &CountrySet {
        &self.countries
    }

    pub fn normalize_country(&self, code: &str) -> Result<CountryCode, RowError> {
        let normalized = CountryCode::normalized(code);
        if self.countries.contains(&normalized) {
            Ok(normalized)
        } else {
            Err(RowError::InvalidCountry {
                code: normalized.as_str().to_string(),
                expected: self.countries.describe(),
            })
        }
    }

    pub fn resolve(&self, zip: &str, country: &str) -> Result<ResolvedPoint, RowError> {
        let zip = zip.trim();
        if zip.is_empty() {
            return Err(RowError::EmptyZip);
        }

        let country = self.normalize_country(country)?;

        let coordinates = self
            .lookup
            .lookup(&country, zip)
            .and_then(|entry| match (entry.latitude, entry.longitude) {
                (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
                    Some((lat, lon, entry.place_name))
                }
                _ => None,
            });

        match coordinates {
            Some((latitude, longitude, place_name)) => Ok(ResolvedPoint {
                latitude,
                longitude,
                place_name,
                country_code: country,
            }),
            None => Err(RowError::ZipNotFound {
                zip: zip.to_string(),
                country: country.as_str().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PostalEntry;
    use std::collections::HashMap;

    struct MockLookup {
        entries: HashMap<(String, String), PostalEntry>,
    }

    impl MockLookup {
        fn new() -> Self {
            let mut entries = HashMap::new();
            entries.insert(
                ("CH".to_string(), "8001".to_string()),
                PostalEntry {
                    latitude: Some(47.3667),
                    longitude: Some(8.55),
                    place_name: "Zürich".to_string(),
                },
            );
            entries.insert(
                ("LI".to_string(), "9490".to_string()),
                PostalEntry {
                    latitude: Some(47.1415),
                    longitude: Some(9.5215),
                    place_name: "Vaduz".to_string(),
                },
            );
            entries.insert(
                ("DE".to_string(), "99999".to_string()),
                PostalEntry {
                    latitude: None,
                    longitude: Some(9.0),
                    place_name: "Nowhere".to_string(),
                },
            );
            entries.insert(
                ("AT".to_string(), "0000".to_string()),
                PostalEntry {
                    latitude: Some(f64::NAN),
                    longitude: Some(9.0),
                    place_name: "Broken".to_string(),
                },
            );
            Self { entries }
        }
    }

    impl PostalLookup for MockLookup {
        fn lookup(&self, country: &CountryCode, postal_code: &str) -> Option<PostalEntry> {
            self.entries
                .get(&(country.as_str().to_string(), postal_code.to_string()))
                .cloned()
        }
    }

    fn resolver() -> PostalResolver<MockLookup> {
        PostalResolver::new(CountrySet::default(), MockLookup::new())
    }

    #[test]
    fn test_normalize_country_is_idempotent() {
        let resolver = resolver();
        for code in DEFAULT_COUNTRIES {
            let once = resolver.normalize_country(code).unwrap();
            let twice = resolver.normalize_country(once.as_str()).unwrap();
            assert_eq!(once, twice);
            assert_eq!(once.as_str(), code);
        }
    }

    #[test]
    fn test_normalize_country_trims_and_uppercases() {
        let resolver = resolver();
        assert_eq!(resolver.normalize_country(" ch ").unwrap().as_str(), "CH");
        assert_eq!(resolver.normalize_country("de").unwrap().as_str(), "DE");
    }

    #[test]
    fn test_normalize_country_rejects_unknown_codes() {
        let resolver = resolver();
        for code in ["", "  ", "fr", "US", "Switzerland", "C H"] {
            let err = resolver.normalize_country(code).unwrap_err();
            assert!(matches!(err, RowError::InvalidCountry { .. }), "{code:?}");
        }

        let err = resolver.normalize_country("fr").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid country code: 'FR' (expected: AT, CH, DE, LI)"
        );
    }

    #[test]
    fn test_configured_country_set() {
        let resolver = PostalResolver::new(CountrySet::new(["fr", " it "]), MockLookup::new());
        assert!(resolver.normalize_country("FR").is_ok());
        assert!(resolver.normalize_country("CH").is_err());
        assert_eq!(resolver.countries().describe(), "FR, IT");
    }

    #[test]
    fn test_resolve_success() {
        let point = resolver().resolve(" 8001 ", "ch").unwrap();
        assert_eq!(point.latitude, 47.3667);
        assert_eq!(point.longitude, 8.55);
        assert_eq!(point.place_name, "Zürich");
        assert_eq!(point.country_code.as_str(), "CH");
    }

    #[test]
    fn test_resolve_empty_zip_regardless_of_country() {
        let resolver = resolver();
        for country in ["CH", "XX", ""] {
            for zip in ["", "   ", "\t"] {
                assert!(matches!(
                    resolver.resolve(zip, country),
                    Err(RowError::EmptyZip)
                ));
            }
        }
    }

    #[test]
    fn test_resolve_invalid_country() {
        let err = resolver().resolve("8001", "XX").unwrap_err();
        assert!(matches!(err, RowError::InvalidCountry { ref code, .. } if code == "XX"));
    }

    #[test]
    fn test_resolve_unknown_zip() {
        let err = resolver().resolve("1234", "CH").unwrap_err();
        assert_eq!(err.to_string(), "ZIP 1234 in CH not found");
    }

    #[test]
    fn test_resolve_missing_or_non_finite_coordinates() {
        let resolver = resolver();
        assert!(matches!(
            resolver.resolve("99999", "DE"),
            Err(RowError::ZipNotFound { .. })
        ));
        assert!(matches!(
            resolver.resolve("0000", "AT"),
            Err(RowError::ZipNotFound { .. })
        ));
    }
}
