mod json;

pub use json::JsonReport;

use crate::engine::ComparisonResult;
use anyhow::Result;

/// Trait for comparison report destinations
pub trait ReportSink {
    /// Write one result; `label` names the candidate when several are compared
    fn write_report(&mut self, label: Option<&str>, result: &ComparisonResult) -> Result<()>;
}
