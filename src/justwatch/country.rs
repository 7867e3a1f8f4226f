//! Country codes used in JustWatch URLs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// ISO 3166-1 alpha-2 country code, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Country(String);

impl Country {
    /// Path segment used in URLs ("us", "de", ...).
    pub fn url_segment(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl Default for Country {
    fn default() -> Self {
        Country("US".to_string())
    }
}

impl FromStr for Country {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Country(code.to_ascii_uppercase()))
        } else {
            Err(format!("Invalid country code: {}. Use a two-letter code such as US or DE", s))
        }
    }
}

impl TryFrom<String> for Country {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Country> for String {
    fn from(country: Country) -> Self {
        country.0
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_parsing() {
        assert_eq!("us".parse::<Country>().unwrap().code(), "US");
        assert_eq!("DE".parse::<Country>().unwrap().code(), "DE");
        assert_eq!(" gb ".parse::<Country>().unwrap().code(), "GB");

        assert!("usa".parse::<Country>().is_err());
        assert!("u1".parse::<Country>().is_err());
        assert!("".parse::<Country>().unwrap_err().contains("Invalid country code"));
    }

    #[test]
    fn test_country_default() {
        assert_eq!(Country::default().code(), "US");
    }

    #[test]
    fn test_url_segment_is_lowercase() {
        assert_eq!("FR".parse::<Country>().unwrap().url_segment(), "fr");
        assert_eq!(Country::default().to_string(), "US");
    }

    #[test]
    fn test_country_serde() {
        let country: Country = serde_json::from_str("\"nl\"").unwrap();
        assert_eq!(country.code(), "NL");
        assert_eq!(serde_json::to_string(&country).unwrap(), "\"NL\"");
        assert!(serde_json::from_str::<Country>("\"Netherlands\"").is_err());
    }
}
