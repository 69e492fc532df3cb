//! Core bundling logic for msgview.
//!
//! Ties together discovery, transcript loading, JSON serialization, and
//! template injection into a single `run` that writes the viewer file.

pub mod dataset;
pub mod discovery;
pub mod loader;
pub mod pipeline;
pub mod template;

pub use pipeline::{BundleResult, ProgressReporter, ScanResult, SilentProgress, run, scan};
