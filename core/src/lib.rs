//! leads-core: cleaning, feature derivation, filtering and aggregation
//! for sales-lead exports.
//!
//! Pipeline: loader → cleaner → features → dataset (cached)
//!           → filter (per interaction) → aggregate.

pub mod aggregate;
pub mod cache;
pub mod cleaner;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod filter;
pub mod loader;
pub mod session;
pub mod types;
