use serde::{Deserialize, Serialize};
use std::fmt;

/// Metadata describing an administrative region.
///
/// Every field is optional; an empty string means the value is absent.
/// Empty fields are skipped when serializing and default to empty when
/// deserializing, so records stay compact on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    /// Commonly used country name
    #[serde(skip_serializing_if = "String::is_empty")]
    pub country: String,

    /// Formal name of the country
    #[serde(skip_serializing_if = "String::is_empty")]
    pub country_long: String,

    /// ISO 3166-1 alpha-2 code
    #[serde(skip_serializing_if = "String::is_empty")]
    pub country_code_2: String,

    /// ISO 3166-1 alpha-3 code
    #[serde(skip_serializing_if = "String::is_empty")]
    pub country_code_3: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub continent: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub region: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub subregion: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub province: String,

    /// ISO 3166-2 code
    #[serde(skip_serializing_if = "String::is_empty")]
    pub province_code: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub city: String,
}

impl Location {
    /// Returns true when no field carries a value.
    pub fn is_empty(&self) -> bool {
        *self == Location::default()
    }

    /// Merge two records field by field, keeping `self`'s value wherever it
    /// is non-empty and falling back to `other` otherwise.
    pub fn combine(&self, other: &Location) -> Location {
        Location {
            country: first_non_empty(&self.country, &other.country),
            country_long: first_non_empty(&self.country_long, &other.country_long),
            country_code_2: first_non_empty(&self.country_code_2, &other.country_code_2),
            country_code_3: first_non_empty(&self.country_code_3, &other.country_code_3),
            continent: first_non_empty(&self.continent, &other.continent),
            region: first_non_empty(&self.region, &other.region),
            subregion: first_non_empty(&self.subregion, &other.subregion),
            province: first_non_empty(&self.province, &other.province),
            province_code: first_non_empty(&self.province_code, &other.province_code),
            city: first_non_empty(&self.city, &other.city),
        }
    }

    /// Fold any number of records with [`Location::combine`], in order.
    pub fn combine_all<'a, I>(locations: I) -> Location
    where
        I: IntoIterator<Item = &'a Location>,
    {
        locations
            .into_iter()
            .fold(Location::default(), |acc, loc| acc.combine(loc))
    }
}

fn first_non_empty(a: &str, b: &str) -> String {
    let value = if a.is_empty() { b } else { a };
    value.to_string()
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREFIX: &str = "<Location>";

        if self.is_empty() {
            return write!(f, "{} Empty Location", PREFIX);
        }

        let mut out = String::from(PREFIX);

        if !self.city.is_empty() {
            out.push_str(&format!(" {},", self.city));
        }

        if !self.province.is_empty() {
            out.push_str(&format!(" {},", self.province));
        }

        if !self.country.is_empty() {
            out.push_str(&format!(" {}", self.country));
        } else if !self.country_long.is_empty() {
            out.push_str(&format!(" {}", self.country_long));
        }

        if !self.country_code_3.is_empty() {
            out.push_str(&format!(" ({})", self.country_code_3));
        } else if !self.country_code_2.is_empty() {
            out.push_str(&format!(" ({})", self.country_code_2));
        }

        if out.len() > PREFIX.len() {
            out.push(',');
        }

        if !self.continent.is_empty() {
            out.push_str(&format!(" {}", self.continent));
        } else if !self.region.is_empty() {
            out.push_str(&format!(" {}", self.region));
        } else if !self.subregion.is_empty() {
            out.push_str(&format!(" {}", self.subregion));
        }

        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn france() -> Location {
        Location {
            country: "France".into(),
            country_long: "French Republic".into(),
            country_code_2: "FR".into(),
            country_code_3: "FRA".into(),
            continent: "Europe".into(),
            region: "Europe".into(),
            subregion: "Western Europe".into(),
            ..Location::default()
        }
    }

    #[test]
    fn test_empty_location() {
        assert!(Location::default().is_empty());
        assert!(!france().is_empty());
        assert_eq!(Location::default().to_string(), "<Location> Empty Location");
    }

    #[test]
    fn test_combine_keeps_first_non_empty() {
        let province = Location {
            country: "Ignored".into(),
            province: "Bretagne".into(),
            province_code: "FR-E".into(),
            ..Location::default()
        };

        let merged = france().combine(&province);
        assert_eq!(merged.country, "France");
        assert_eq!(merged.province, "Bretagne");
        assert_eq!(merged.province_code, "FR-E");
        assert_eq!(merged.country_code_3, "FRA");
    }

    #[test]
    fn test_combine_all_order() {
        let province_only = Location {
            province: "Bretagne".into(),
            ..Location::default()
        };
        let merged = Location::combine_all([&province_only, &france()]);
        assert_eq!(merged.province, "Bretagne");
        assert_eq!(merged.country, "France");
        assert_eq!(Location::combine_all(std::iter::empty()), Location::default());
    }

    #[test]
    fn test_display_full() {
        let loc = Location {
            city: "Rennes".into(),
            province: "Bretagne".into(),
            ..france()
        };
        assert_eq!(
            loc.to_string(),
            "<Location> Rennes, Bretagne, France (FRA), Europe"
        );
    }

    #[test]
    fn test_display_fallbacks() {
        let loc = Location {
            country_long: "French Republic".into(),
            country_code_2: "FR".into(),
            subregion: "Western Europe".into(),
            ..Location::default()
        };
        assert_eq!(
            loc.to_string(),
            "<Location> French Republic (FR), Western Europe"
        );

        let continent_only = Location {
            continent: "Antarctica".into(),
            ..Location::default()
        };
        assert_eq!(continent_only.to_string(), "<Location> Antarctica");
    }

    #[test]
    fn test_json_skips_empty_fields() {
        let loc = Location {
            country: "France".into(),
            country_code_2: "FR".into(),
            ..Location::default()
        };
        let json = serde_json::to_string(&loc).unwrap();
        assert_eq!(json, r#"{"country":"France","country_code_2":"FR"}"#);

        let back: Location = serde_json::from_str(&json).unwrap();
        assert_eq!(back, loc);

        let empty: Location = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }
}
