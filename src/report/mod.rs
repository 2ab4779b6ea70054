use crate::metrics::LoadReport;
use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

fn ms(d: Duration) -> String {
    format!("{:.3}", d.as_secs_f64() * 1e3)
}

/// Render the report as a self-contained HTML page: one table row per
/// operation label with its call count and timing aggregates.
pub fn render_html(strategy: &str, report: &LoadReport) -> String {
    let mut rows = String::new();
    for (label, stats) in &report.ops {
        rows.push_str(&format!(
            "    <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            label,
            stats.calls,
            stats.failures,
            ms(stats.total),
            ms(stats.mean),
            ms(stats.min),
            ms(stats.max),
        ));
    }
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n\
         <title>Load report</title>\n\
         <style>table, th, td {{ border: 1px solid black; border-collapse: collapse; padding: 4px; }}</style>\n\
         </head>\n<body>\n\
         <h1>Load report</h1>\n\
         <p>Strategy: {} &mdash; generated {}</p>\n\
         <table>\n\
         \x20   <tr><th>operation</th><th>calls</th><th>failures</th>\
         <th>total (ms)</th><th>mean (ms)</th><th>min (ms)</th><th>max (ms)</th></tr>\n\
         {}</table>\n\
         </body>\n</html>\n",
        strategy,
        Utc::now().to_rfc3339(),
        rows
    )
}

/// Write the HTML rendering to `path`. Viewing it is left to the user; the
/// written location is logged.
pub fn write_html(path: &Path, strategy: &str, report: &LoadReport) -> Result<()> {
    fs::write(path, render_html(strategy, report))
        .with_context(|| format!("writing HTML report to {}", path.display()))?;
    info!(path = %path.display(), "report written, open it in a browser to view");
    Ok(())
}

/// Write a machine-readable JSON rendering of the same report.
pub fn write_json(path: &Path, strategy: &str, report: &LoadReport) -> Result<()> {
    let doc = json!({
        "strategy": strategy,
        "generated": Utc::now().to_rfc3339(),
        "ops": report.ops,
    });
    fs::write(path, serde_json::to_string_pretty(&doc)?)
        .with_context(|| format!("writing JSON report to {}", path.display()))?;
    info!(path = %path.display(), "JSON report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricsRecorder, OpLabel};
    use anyhow::Result;
    use tempfile::tempdir;

    fn sample() -> LoadReport {
        let mut metrics = MetricsRecorder::new();
        for _ in 0..3 {
            let _: std::result::Result<(), ()> = metrics.time(OpLabel::BatchExecute, || Ok(()));
        }
        metrics.summarize()
    }

    #[test]
    fn html_lists_every_operation_label() {
        let html = render_html("single-batch", &sample());
        assert!(html.contains("single-batch"));
        assert!(html.contains("<td>batch-execute</td>"));
        assert!(html.contains("<td>3</td>"));
    }

    #[test]
    fn reports_land_on_disk() -> Result<()> {
        let dir = tempdir()?;
        let report = sample();
        let html = dir.path().join("report.html");
        let jsonp = dir.path().join("report.json");
        write_html(&html, "single-batch", &report)?;
        write_json(&jsonp, "single-batch", &report)?;

        assert!(fs::read_to_string(&html)?.contains("batch-execute"));
        let parsed: serde_json::Value = serde_json::from_str(&fs::read_to_string(&jsonp)?)?;
        assert_eq!(parsed["ops"]["batch-execute"]["calls"], 3);
        Ok(())
    }
}
