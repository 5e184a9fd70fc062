use globe_rs::models::{Country, User};

const GERMANY: &str = r#"
{
  "name": "Germany",
  "topLevelDomain": [".de"],
  "alpha2Code": "DE",
  "alpha3Code": "DEU",
  "callingCodes": ["49"],
  "capital": "Berlin",
  "altSpellings": ["DE", "Federal Republic of Germany"],
  "subregion": "Central Europe",
  "region": "Europe",
  "population": 83240525,
  "latlng": [51.0, 9.0],
  "demonym": "German",
  "area": 357114.0,
  "timezones": ["UTC+01:00"],
  "borders": ["AUT", "BEL", "CZE", "DNK", "FRA", "LUX", "NLD", "POL", "CHE"],
  "nativeName": "Deutschland",
  "numericCode": "276",
  "flags": {
    "svg": "https://flagcdn.com/de.svg",
    "png": "https://flagcdn.com/w320/de.png"
  },
  "currencies": [{"code": "EUR", "name": "Euro", "symbol": "€"}],
  "languages": [
    {"iso639_1": "de", "iso639_2": "deu", "name": "German", "nativeName": "Deutsch"}
  ],
  "independent": true
}
"#;

#[test]
fn parse_full_country_record() {
    let c: Country = serde_json::from_str(GERMANY).unwrap();
    assert_eq!(c.alpha3_code, "DEU");
    assert_eq!(c.alpha2_code, "DE");
    assert_eq!(c.capital.as_deref(), Some("Berlin"));
    assert_eq!(c.population, 83_240_525);
    assert_eq!(c.borders.len(), 9);
    assert_eq!(c.flags.svg.as_deref(), Some("https://flagcdn.com/de.svg"));
    assert!(c.speaks("de"));
    assert!(!c.speaks("fr"));
    assert_eq!(c.language_names(), "German");
    assert_eq!(c.currency_names(), "Euro (€)");
    assert_eq!(c.calling_codes, ["49"]);
    assert_eq!(c.top_level_domain, [".de"]);
}

#[test]
fn sparse_records_fall_back_to_empty_fields() {
    // Antarctica-style entry: no capital, no borders, no currencies
    let c: Country = serde_json::from_str(
        r#"{"name":"Antarctica","alpha3Code":"ATA","region":"Polar","population":1000}"#,
    )
    .unwrap();
    assert_eq!(c.capital, None);
    assert!(c.borders.is_empty());
    assert!(c.languages.is_empty());
    assert_eq!(c.currency_names(), "N/A");
}

#[test]
fn population_accepts_string_or_null() {
    let c: Country =
        serde_json::from_str(r#"{"name":"X","alpha3Code":"XXX","population":"1200"}"#).unwrap();
    assert_eq!(c.population, 1200);
    let c: Country =
        serde_json::from_str(r#"{"name":"X","alpha3Code":"XXX","population":null}"#).unwrap();
    assert_eq!(c.population, 0);
    assert!(
        serde_json::from_str::<Country>(r#"{"name":"X","alpha3Code":"XXX","population":-1}"#)
            .is_err()
    );
}

#[test]
fn language_without_iso_code_parses() {
    let c: Country = serde_json::from_str(
        r#"{"name":"X","alpha3Code":"XXX","languages":[{"iso639_2":"ckb","name":"Sorani"}]}"#,
    )
    .unwrap();
    assert_eq!(c.languages[0].iso639_1, None);
    assert!(!c.speaks(""));
}

#[test]
fn favorites_snapshot_keeps_wire_names() {
    let c: Country = serde_json::from_str(GERMANY).unwrap();
    let v = serde_json::to_value(&c).unwrap();
    assert_eq!(v["alpha3Code"], "DEU");
    assert_eq!(v["languages"][0]["iso639_1"], "de");

    // A user record written by the store reads back with the snapshot intact.
    let raw = format!(
        r#"{{"id":"1","name":"Ada","email":"ada@example.com","password":"secret1","favorites":[{}]}}"#,
        serde_json::to_string(&c).unwrap()
    );
    let u: User = serde_json::from_str(&raw).unwrap();
    assert_eq!(u.favorites, vec![c]);
}
