use crate::app::{AppError, RunSummary};
use mapper_core::ScanCounters;
use serde::Serialize;
use std::io::{self, Write};

pub fn summary_line(c: &ScanCounters) -> String {
    format!(
        "Scanned {} images; {} with GPS; {} skipped.",
        c.total, c.with_gps, c.skipped
    )
}

#[derive(Serialize)]
struct JsonSummary<'a> {
    status: &'static str,
    output: String,
    #[serde(flatten)]
    counters: &'a ScanCounters,
}

pub fn success(out: &mut dyn Write, summary: &RunSummary, json: bool) -> io::Result<()> {
    if json {
        let body = JsonSummary {
            status: "ok",
            output: summary.output.display().to_string(),
            counters: &summary.counters,
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&body)?)
    } else {
        writeln!(out, "Wrote KML: {}", summary.output.display())?;
        writeln!(out, "{}", summary_line(&summary.counters))
    }
}

pub fn failure(err: &mut dyn Write, error: &AppError) -> io::Result<()> {
    writeln!(err, "{}", error)?;
    if let AppError::NoGeotaggedImages(counters) = error {
        writeln!(err, "{}", summary_line(counters))?;
    }
    Ok(())
}
