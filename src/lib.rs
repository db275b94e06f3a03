//! # nutriscope
//!
//! Descriptive statistics, cross-category comparison and row filtering for
//! menu nutrition tables, plus a chat assistant that answers questions over
//! the raw data.
//!
//! ## Quick Start
//!
//! ```no_run
//! use nutriscope::analyser::{Catalog, FilterCriterion, LoadOptions, load_table};
//! use std::path::Path;
//!
//! # fn example() -> nutriscope::error::Result<()> {
//! let options = LoadOptions::default();
//! let food = load_table(Path::new("data/food.csv"), "food", &options)?;
//! let drinks = load_table(Path::new("data/drinks.csv"), "drinks", &options)?;
//!
//! let mut builder = Catalog::builder();
//! builder.register("food", food).register("drinks", drinks);
//! let catalog = builder.build();
//!
//! let stats = catalog.descriptive_stats()?;
//! let comparison = catalog.compare(None)?;
//! let light = catalog.filter_many(&"Calories < 200".parse::<FilterCriterion>()?, None)?;
//! # let _ = (stats, comparison, light);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`analyser`]: loader, catalog and the statistics engine
//! - [`report`]: text tables and bar charts for engine results
//! - [`ai`]: chat assistant over the raw tables
//! - [`config`]: JSON settings and the API key
//! - [`error`]: crate error type
//! - [`logging`]: tracing setup
//! - [`utils`]: shared helpers

#![warn(clippy::all, rust_2018_idioms)]

pub mod ai;
pub mod analyser;
pub mod config;
pub mod error;
pub mod logging;
pub mod report;
pub mod utils;
