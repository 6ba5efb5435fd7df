//! NJ Transit bus fare collector
//!
//! Looks up bus fares between towns on the carrier's trip planner, keeps every
//! fetched page in an on-disk cache, and gathers fares for whole route lists
//! into an origin/destination report.

pub mod batch;
pub mod cache;
pub mod cli;
pub mod data;
pub mod logging;
