use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One country record as returned by the REST Countries v2 API.
///
/// Wire names are camelCase (`alpha3Code`, `callingCodes`, ...). Serialization
/// uses the same names, so a record saved inside a user's favorites can be read
/// back with the same decoder. Fields the API omits fall back to empty values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub name: String,
    #[serde(default)]
    pub native_name: Option<String>,
    #[serde(default)]
    pub alpha2_code: String,
    /// Unique key used everywhere in this crate (favorites, borders, lookups).
    pub alpha3_code: String,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub subregion: Option<String>,
    /// Some mirrors encode the population as a string, others as a number.
    #[serde(default, deserialize_with = "de_u64_from_string_or_number")]
    pub population: u64,
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub languages: Vec<Language>,
    #[serde(default)]
    pub currencies: Vec<Currency>,
    #[serde(default)]
    pub flags: Flags,
    #[serde(default)]
    pub borders: Vec<String>,
    #[serde(default)]
    pub calling_codes: Vec<String>,
    #[serde(default)]
    pub timezones: Vec<String>,
    #[serde(default)]
    pub top_level_domain: Vec<String>,
}

impl Country {
    /// True when one of the country's languages carries the given ISO 639-1 code.
    pub fn speaks(&self, code: &str) -> bool {
        self.languages
            .iter()
            .any(|l| l.iso639_1.as_deref() == Some(code))
    }

    /// Comma-separated language names, or `N/A`.
    pub fn language_names(&self) -> String {
        if self.languages.is_empty() {
            return "N/A".into();
        }
        self.languages
            .iter()
            .map(|l| l.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Comma-separated `Name (symbol)` list, or `N/A`.
    pub fn currency_names(&self) -> String {
        if self.currencies.is_empty() {
            return "N/A".into();
        }
        self.currencies
            .iter()
            .map(|c| {
                format!(
                    "{} ({})",
                    c.name.as_deref().unwrap_or("Unknown"),
                    c.symbol.as_deref().unwrap_or("No symbol")
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    /// Two-letter code; a handful of languages in the dataset have none.
    #[serde(rename = "iso639_1", default)]
    pub iso639_1: Option<String>,
    #[serde(rename = "iso639_2", default)]
    pub iso639_2: Option<String>,
    pub name: String,
    #[serde(default)]
    pub native_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Currency {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

/// Flag image URLs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Flags {
    #[serde(default)]
    pub svg: Option<String>,
    #[serde(default)]
    pub png: Option<String>,
}

/// Entry of the distinct-language catalogue (`code` is ISO 639-1).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LanguageOption {
    pub code: String,
    pub name: String,
}

/// Display order of the country list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    #[default]
    NameAsc,
    NameDesc,
    PopulationAsc,
    PopulationDesc,
}

impl SortOrder {
    pub const ALL: [SortOrder; 4] = [
        SortOrder::NameAsc,
        SortOrder::NameDesc,
        SortOrder::PopulationAsc,
        SortOrder::PopulationDesc,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::NameAsc => "Name (A-Z)",
            SortOrder::NameDesc => "Name (Z-A)",
            SortOrder::PopulationAsc => "Population (Low to High)",
            SortOrder::PopulationDesc => "Population (High to Low)",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortOrder::NameAsc => "nameAsc",
            SortOrder::NameDesc => "nameDesc",
            SortOrder::PopulationAsc => "populationAsc",
            SortOrder::PopulationDesc => "populationDesc",
        };
        f.write_str(s)
    }
}

/// Accepts `nameAsc`, `name-asc`, `NAME_ASC`, and the `pop` shorthand.
impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "nameasc" | "name" => Ok(SortOrder::NameAsc),
            "namedesc" => Ok(SortOrder::NameDesc),
            "populationasc" | "popasc" | "population" => Ok(SortOrder::PopulationAsc),
            "populationdesc" | "popdesc" => Ok(SortOrder::PopulationDesc),
            _ => Err(format!(
                "unknown sort order '{}', expected one of nameAsc, nameDesc, populationAsc, populationDesc",
                s
            )),
        }
    }
}

/// A locally registered account. Passwords are stored as entered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    /// Snapshots of the countries at the time they were saved, unique by code.
    #[serde(default)]
    pub favorites: Vec<Country>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Form payload for `IdentityStore::register`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Serde helper: parse `u64` from a JSON number, a numeric string, or `null`.
fn de_u64_from_string_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct U64Visitor;

    impl<'de> Visitor<'de> for U64Visitor {
        type Value = u64;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a string or integer representing a non-negative number")
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u64::try_from(v).map_err(|_| E::custom("negative population"))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v < 0.0 {
                return Err(E::custom("population must be a non-negative number"));
            }
            Ok(v.round() as u64)
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            s.trim().parse::<u64>().map_err(E::custom)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(0)
        }
    }

    deserializer.deserialize_any(U64Visitor)
}
