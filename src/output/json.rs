use super::ReportSink;
use crate::engine::ComparisonResult;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct LabelledResult<'a> {
    candidate: &'a str,
    #[serde(flatten)]
    result: &'a ComparisonResult,
}

/// Writes each result as a JSON document followed by a newline
///
/// Compact output is line-delimited JSON. Pretty output spreads each document
/// over several lines, so it must be read as a stream of concatenated values.
pub struct JsonReport<W: Write> {
    writer: W,
    pretty: bool,
}

impl<W: Write> JsonReport<W> {
    pub fn new(writer: W, pretty: bool) -> Self {
        Self { writer, pretty }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_value<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let written = if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, value)
        } else {
            serde_json::to_writer(&mut self.writer, value)
        };
        written.context("Failed to serialize comparison result")?;
        self.writer
            .write_all(b"\n")
            .context("Failed to write comparison result")?;
        Ok(())
    }
}

impl<W: Write> ReportSink for JsonReport<W> {
    fn write_report(&mut self, label: Option<&str>, result: &ComparisonResult) -> Result<()> {
        if let Some(candidate) = label {
            self.write_value(&LabelledResult { candidate, result })?;
        } else {
            self.write_value(result)?;
        }
        self.writer.flush().context("Failed to flush report output")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> ComparisonResult {
        ComparisonResult {
            average_similarity: 0.75,
            flow_similarity: 0.5,
            max_delay: 1,
            ideal_calories: 0.36,
            actual_calories: 0.3,
            feedback: Vec::new(),
        }
    }

    #[test]
    fn unlabelled_report_is_the_bare_record() {
        let mut sink = JsonReport::new(Vec::new(), false);
        sink.write_report(None, &result()).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(text.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 5);
        assert_eq!(value["max_delay"], 1);
    }

    #[test]
    fn labelled_report_names_candidate() {
        let mut sink = JsonReport::new(Vec::new(), false);
        sink.write_report(Some("learner-a"), &result()).unwrap();
        sink.write_report(Some("learner-b"), &result()).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let value: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(value["candidate"], "learner-b");
        assert_eq!(value["average_similarity"], 0.75);
    }

    #[test]
    fn pretty_reports_parse_as_a_value_stream() {
        let mut sink = JsonReport::new(Vec::new(), true);
        sink.write_report(Some("learner-a"), &result()).unwrap();
        sink.write_report(Some("learner-b"), &result()).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(text.lines().count() > 2);

        let values: Vec<serde_json::Value> = serde_json::Deserializer::from_str(&text)
            .into_iter()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0]["candidate"], "learner-a");
        assert_eq!(values[1]["candidate"], "learner-b");
    }
}
