//! Filter/sort pipeline behind the country list.
//!
//! A [`CountryQuery`] is applied in a fixed order: name search (delegated to a
//! [`CountrySource`], normally the API), then region, then language, then one
//! stable sort. Empty filter values mean "all".

use crate::models::{Country, LanguageOption, SortOrder};
use ahash::AHashMap;
use anyhow::Result;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Number of countries on the home page's featured strip.
pub const FEATURED_COUNT: usize = 8;

/// Where name searches go. The API client implements this; tests plug in a
/// fixed list.
pub trait CountrySource {
    fn search_by_name(&self, name: &str) -> Result<Vec<Country>>;
}

/// User-selected list state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryQuery {
    pub search: String,
    pub region: String,
    /// ISO 639-1 code.
    pub language: String,
    pub sort: SortOrder,
}

impl CountryQuery {
    /// True for the "clear all filters" state.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Any of search/region/language set.
    pub fn has_filters(&self) -> bool {
        !self.search.trim().is_empty()
            || !self.region.trim().is_empty()
            || !self.language.trim().is_empty()
    }
}

/// Run the whole pipeline over `all`.
///
/// Only the search step can fail (it goes to `source`); region and language
/// narrowing never error, an unknown value just yields an empty list.
pub fn apply<S: CountrySource + ?Sized>(
    all: &[Country],
    query: &CountryQuery,
    source: &S,
) -> Result<Vec<Country>> {
    let search = query.search.trim();
    let results = if search.is_empty() {
        all.to_vec()
    } else {
        source.search_by_name(search)?
    };
    let results = filter_by_region(results, &query.region);
    let mut results = filter_by_language(results, &query.language);
    sort_countries(&mut results, query.sort);
    Ok(results)
}

/// Keep countries whose region equals `region` exactly.
pub fn filter_by_region(countries: Vec<Country>, region: &str) -> Vec<Country> {
    let region = region.trim();
    if region.is_empty() {
        return countries;
    }
    countries.into_iter().filter(|c| c.region == region).collect()
}

/// Keep countries that list the ISO 639-1 `code` among their languages.
pub fn filter_by_language(countries: Vec<Country>, code: &str) -> Vec<Country> {
    let code = code.trim();
    if code.is_empty() {
        return countries;
    }
    countries.into_iter().filter(|c| c.speaks(code)).collect()
}

/// Stable in-place sort. Equal keys keep their input order, so sorting an
/// already sorted list is a no-op.
pub fn sort_countries(countries: &mut [Country], order: SortOrder) {
    match order {
        SortOrder::NameAsc => countries.sort_by(|a, b| cmp_names(&a.name, &b.name)),
        SortOrder::NameDesc => countries.sort_by(|a, b| cmp_names(&b.name, &a.name)),
        SortOrder::PopulationAsc => countries.sort_by_key(|c| c.population),
        SortOrder::PopulationDesc => countries.sort_by(|a, b| b.population.cmp(&a.population)),
    }
}

// Accent- and case-folded first, so "Åland" sits with the A's and "Côte" between
// "Costa" and "Croatia"; raw strings break ties.
fn cmp_names(a: &str, b: &str) -> Ordering {
    name_key(a)
        .cmp(&name_key(b))
        .then_with(|| a.cmp(b))
}

fn name_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Distinct, non-empty regions in alphabetical order.
pub fn regions(countries: &[Country]) -> Vec<String> {
    let mut out: Vec<String> = countries
        .iter()
        .map(|c| c.region.trim())
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Distinct languages keyed by ISO 639-1 code, in first-seen order.
///
/// When the same code shows up with different names, the last name wins.
/// Languages without a code can't be filtered on and are left out.
pub fn languages(countries: &[Country]) -> Vec<LanguageOption> {
    let mut index: AHashMap<String, usize> = AHashMap::new();
    let mut out: Vec<LanguageOption> = Vec::new();
    for lang in countries.iter().flat_map(|c| c.languages.iter()) {
        let Some(code) = lang.iso639_1.as_deref().filter(|c| !c.is_empty()) else {
            continue;
        };
        match index.get(code).copied() {
            Some(i) => out[i].name = lang.name.clone(),
            None => {
                index.insert(code.to_string(), out.len());
                out.push(LanguageOption {
                    code: code.to_string(),
                    name: lang.name.clone(),
                });
            }
        }
    }
    out
}

/// Random sample of up to `n` countries.
pub fn featured<R: Rng + ?Sized>(countries: &[Country], n: usize, rng: &mut R) -> Vec<Country> {
    let mut shuffled = countries.to_vec();
    shuffled.shuffle(rng);
    shuffled.truncate(n);
    shuffled
}
