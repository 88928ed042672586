//! Core data models for the dashboard.

mod ids;
mod player;
mod rating;

pub use ids::*;
pub use player::*;
pub use rating::*;
