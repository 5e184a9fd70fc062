use crate::models::Country;
use anyhow::Result;
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

// Spreadsheet apps evaluate cells starting with these as formulas.
fn defuse(cell: &str) -> String {
    match cell.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') => format!("'{}", cell),
        _ => cell.to_string(),
    }
}

/// Save countries as CSV with header. Text cells that could be read as
/// formulas get a leading `'`.
pub fn save_csv<P: AsRef<Path>>(countries: &[Country], path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.write_record([
        "alpha3_code",
        "name",
        "capital",
        "region",
        "subregion",
        "population",
        "languages",
    ])?;
    for c in countries {
        let languages = c
            .languages
            .iter()
            .map(|l| l.name.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        wtr.write_record([
            defuse(&c.alpha3_code),
            defuse(&c.name),
            defuse(c.capital.as_deref().unwrap_or("")),
            defuse(&c.region),
            defuse(c.subregion.as_deref().unwrap_or("")),
            c.population.to_string(),
            defuse(&languages),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save countries as a pretty JSON array using the API's field names.
pub fn save_json<P: AsRef<Path>>(countries: &[Country], path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(countries)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
