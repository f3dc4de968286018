//! # Sink Module
//!
//! Destinations for the pipeline's selections.
//!
//! The pipeline calls [`GroupSink::accept`] once per group, in grouping
//! order, then [`GroupSink::finish`] once. A failing `accept` is recorded
//! against the file and the run moves on to the next selection.
//!
//! ## Sinks
//! - [`CopySink`] - copy kept files into an output directory
//! - [`UploadSink`] - push kept files and thumbnails to an object store,
//!   then publish the manifest
//! - [`crate::core::reporter::HtmlReportSink`] - HTML page of duplicate sets

mod copy;
mod upload;

pub use copy::CopySink;
pub use upload::{UploadConfig, UploadSink};

use crate::core::comparator::Selection;
use crate::error::SinkError;

/// Receives one [`Selection`] per similarity group
pub trait GroupSink {
    /// Short label for logs and failure records
    fn name(&self) -> &'static str;

    fn accept(&mut self, selection: &Selection) -> Result<(), SinkError>;

    /// Called once after the last selection
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}
