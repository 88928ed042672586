//! # Chess Dash
//!
//! A ranking dashboard over a CSV of periodic player snapshots.
//!
//! ## Architecture
//!
//! - **storage**: CSV loading into typed player records
//! - **resolve**: Freshest-snapshot selection per player
//! - **filter**: Country, title and rank predicates plus widget options
//! - **calculate**: Mean ratings, distribution summaries and histograms
//! - **charts**: Chart specifications for the ranking, distribution and comparison views
//! - **cache**: Memoized resolution keyed by dataset fingerprint and run date
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod cache;
pub mod calculate;
pub mod charts;
pub mod config;
pub mod filter;
pub mod models;
pub mod resolve;
pub mod storage;

pub use models::*;
