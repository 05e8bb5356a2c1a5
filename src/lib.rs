//! Container load planning for furniture sets.
//!
//! Items are packed by a deterministic first-fit-decreasing engine
//! ([`optimizer`]); the [`planner`] runs it twice so that only complete sets
//! end up in the final layout.

pub mod api;
pub mod catalog;
pub mod config;
pub mod geometry;
pub mod groups;
pub mod model;
pub mod optimizer;
pub mod planner;
pub mod report;
pub mod types;
