//! HAR capture and accumulation
//!
//! This crate collects one HAR per iteration from the in-page exporter and
//! merges the run's captures at the end.
//!
//! # Features
//!
//! - **HarCollector**: export trigger, shape normalization, accumulation, merge
//! - **ResponseBodyFilter**: `none` / `html` / `all` response body retention
//! - **AliasUrlResolver**: stable page URLs for single-page-app aliases

mod alias;
mod body_filter;
mod collector;

pub use alias::AliasUrlResolver;
pub use body_filter::ResponseBodyFilter;
pub use collector::{HarCollector, FAILURE_GENERATOR, HAR_EXPORT_LABEL};
