//! Core library surface for the Moscow residential valuation engine.
//!
//! Everything in this crate is a library API: address normalization,
//! region/segment resolution, KNN and grid-based valuation, the combined
//! listings+deals engine, duplicate/repost detection, and the investment
//! interest-price calculator. The HTTP surface that consumes these (beyond
//! the ambient health check in `src/main.rs`) is an external collaborator,
//! out of scope for this crate.

pub mod address;
pub mod config;
pub mod db;
pub mod duplicate;
pub mod error;
pub mod geo_utils;
pub mod grid;
pub mod investment;
pub mod models;
pub mod segment;
pub mod valuation;

pub use error::{CoreError, CoreResult};
