//! globe_rs
//!
//! A small Rust library for browsing the world's countries through the public
//! REST Countries API, with a local account system for keeping favorites.
//! Pairs with the `globe` CLI.
//!
//! ### Features
//! - Fetch all countries, search by name, list a region, look up by code
//! - Filter by region and language, sort by name or population
//! - Register/login against a local JSON user table; save favorite countries
//! - Export a country list as CSV or JSON
//!
//! ### Example
//! ```no_run
//! use globe_rs::{Client, CountryQuery, SortOrder};
//!
//! let client = Client::default();
//! let all = client.all()?;
//! let query = CountryQuery {
//!     region: "Europe".into(),
//!     sort: SortOrder::PopulationDesc,
//!     ..Default::default()
//! };
//! let shown = globe_rs::pipeline::apply(&all, &query, &client)?;
//! globe_rs::export::save_csv(&shown, "europe.csv")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod config;
pub mod export;
pub mod identity;
pub mod models;
pub mod pipeline;
pub mod storage;

pub use api::Client;
pub use config::Config;
pub use identity::{AuthError, IdentityStore};
pub use models::{Country, LanguageOption, NewUser, SortOrder, User};
pub use pipeline::CountryQuery;
