/// Synchronous client for the **REST Countries API (v2)**.
///
/// Covers the four endpoints the browser needs: `all`, `name/{name}`,
/// `region/{region}` and `alpha/{code}`. Responses decode into
/// [`models::Country`](crate::models::Country) records.
///
/// ### Notes
/// - Requests are made once. There is no retry; callers decide what an error means
///   for their view (the CLI logs it and shows an empty list).
/// - A 404 from the name search means "no matches" and yields an empty list.
/// - A 404/400 from the code lookup yields `None`.
///
/// Typical usage:
/// ```no_run
/// # use globe_rs::Client;
/// let client = Client::default();
/// let european = client.by_region("Europe")?;
/// let germany = client.by_code("DEU")?;
/// # Ok::<(), anyhow::Error>(())
/// ```
use crate::config::Config;
use crate::models::{Country, LanguageOption};
use crate::pipeline::{self, CountrySource};
use anyhow::{Context, Result, bail};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Client {
    pub base_url: String,
    http: HttpClient,
}

impl Default for Client {
    fn default() -> Self {
        Self::new(&Config::default()).expect("reqwest client build")
    }
}

// Allow -, _, . unescaped in path segments (codes and region names)
const SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

fn enc_segment(s: &str) -> String {
    percent_encoding::utf8_percent_encode(s.trim(), SAFE).to_string()
}

fn is_loopback(base_url: &str) -> bool {
    let Ok(url) = reqwest::Url::parse(base_url) else {
        return false;
    };
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    host.eq_ignore_ascii_case("localhost")
        || host
            .parse::<std::net::IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false)
}

impl Client {
    /// Build a client from the runtime configuration.
    pub fn new(cfg: &Config) -> Result<Self> {
        let mut builder = HttpClient::builder()
            .timeout(cfg.timeout()) // total request timeout
            .connect_timeout(Duration::from_secs(10).min(cfg.timeout()))
            .redirect(Policy::limited(5)) // cap redirects
            .user_agent(concat!("globe_rs/", env!("CARGO_PKG_VERSION")));
        // A local mirror never goes through the system proxy.
        if is_loopback(&cfg.base_url) {
            builder = builder.no_proxy();
        }
        let http = builder.build().context("build http client")?;
        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Every country known to the API.
    pub fn all(&self) -> Result<Vec<Country>> {
        let url = format!("{}/all", self.base_url);
        self.get_list(&url, &[])
    }

    /// Countries whose name (or native/alternative name) matches `name`.
    ///
    /// A 404 from the API is "no results", not an error.
    pub fn search_by_name(&self, name: &str) -> Result<Vec<Country>> {
        if name.trim().is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/name/{}", self.base_url, enc_segment(name));
        self.get_list(&url, &[StatusCode::NOT_FOUND])
    }

    /// Countries of one region (e.g. `Europe`, `Americas`).
    pub fn by_region(&self, region: &str) -> Result<Vec<Country>> {
        if region.trim().is_empty() {
            bail!("region must not be empty");
        }
        let url = format!("{}/region/{}", self.base_url, enc_segment(region));
        self.get_list(&url, &[])
    }

    /// A single country by its alpha-2 or alpha-3 code; `None` when the API
    /// doesn't know the code.
    pub fn by_code(&self, code: &str) -> Result<Option<Country>> {
        if code.trim().is_empty() {
            return Ok(None);
        }
        let url = format!("{}/alpha/{}", self.base_url, enc_segment(code));
        self.get_json(&url, &[StatusCode::NOT_FOUND, StatusCode::BAD_REQUEST])
    }

    /// Distinct languages spoken across all countries.
    pub fn languages(&self) -> Result<Vec<LanguageOption>> {
        let all = self.all().context("fetch countries for language list")?;
        Ok(pipeline::languages(&all))
    }

    /// Countries that list the given ISO 639-1 language code.
    pub fn by_language(&self, code: &str) -> Result<Vec<Country>> {
        let all = self.all().context("fetch countries for language filter")?;
        Ok(pipeline::filter_by_language(all, code))
    }

    /// Resolve a country's border codes into full records, in border order.
    ///
    /// Codes the API can't resolve are skipped.
    pub fn borders(&self, country: &Country) -> Result<Vec<Country>> {
        let mut out = Vec::with_capacity(country.borders.len());
        for code in &country.borders {
            match self.by_code(code)? {
                Some(c) => out.push(c),
                None => log::warn!("border country {} not found", code),
            }
        }
        Ok(out)
    }

    fn get_list(&self, url: &str, empty_on: &[StatusCode]) -> Result<Vec<Country>> {
        Ok(self.get_json(url, empty_on)?.unwrap_or_default())
    }

    /// GET `url` and decode the body. Statuses listed in `missing_on` map to `Ok(None)`.
    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        missing_on: &[StatusCode],
    ) -> Result<Option<T>> {
        log::debug!("GET {}", url);
        let resp = self
            .http
            .get(url)
            .send()
            .with_context(|| format!("GET {}", url))?;
        let status = resp.status();
        if missing_on.contains(&status) {
            log::debug!("GET {} -> {}, treating as no data", url, status);
            return Ok(None);
        }
        if !status.is_success() {
            bail!("GET {} failed with HTTP {}", url, status);
        }
        let v: Value = resp
            .json()
            .with_context(|| format!("decode json from {}", url))?;
        let v = check_api_error(v)?;
        let parsed = serde_json::from_value(v).with_context(|| format!("parse {}", url))?;
        Ok(Some(parsed))
    }
}

/// Some deployments answer with HTTP 200 and a `{"status":..,"message":..}`
/// body instead of a proper status code. Surface that as an error.
fn check_api_error(v: Value) -> Result<Value> {
    if let Some(obj) = v.as_object() {
        if obj.contains_key("message") && obj.contains_key("status") && !obj.contains_key("name")
        {
            bail!("rest countries api error: {}", v);
        }
    }
    Ok(v)
}

impl CountrySource for Client {
    fn search_by_name(&self, name: &str) -> Result<Vec<Country>> {
        Client::search_by_name(self, name)
    }
}
