//! Gecko profiler lifecycle control
//!
//! This crate starts and stops the sampling profiler inside the browser once
//! per iteration and retrieves the dumped profile.
//!
//! # Features
//!
//! - **ProfilerController**: start/dump/stop sequencing with best-effort cleanup
//! - **ProfilerSession**: per-iteration settings and the start command
//! - **ApiVariant**: detection of the five- and seven-argument start function

mod controller;
mod types;

pub use controller::{
    device_profile_path, profile_file_name, ProfilerController, DEVICE_PROFILE_DIR,
    DUMP_PROFILE_LABEL, PROFILER_ARITY_LABEL, START_PROFILER_LABEL, STOP_PROFILER_LABEL,
};
pub use types::*;
