use chrono::Local;
use serde::Serialize;
use std::time::Duration;

/// Counters and results for one completed run.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub input_count: usize,
    pub reduced_count: usize,
    pub sitemap_confirmed: usize,
    /// URLs that went into HTTP classification after the cap.
    pub classified_count: usize,
    pub http_live: usize,
    pub needs_js: usize,
    pub js_live: usize,
    /// Final deduplicated live set, in confirmation order.
    pub live_urls: Vec<String>,
    #[serde(skip)]
    pub http_elapsed: Duration,
    #[serde(skip)]
    pub js_elapsed: Duration,
    #[serde(skip)]
    pub total_elapsed: Duration,
}

/// Generate the run summary shown after a check.
pub fn generate_check_report(report: &CheckReport) -> String {
    let mut out = String::new();

    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    out.push_str("# Summary:\n");
    out.push_str(&format!("  Input URLs:          {}\n", report.input_count));
    out.push_str(&format!("  After reduction:     {}\n", report.reduced_count));
    out.push_str(&format!("  Sitemap-confirmed:   {}\n", report.sitemap_confirmed));
    out.push_str(&format!("  Classified via HTTP: {}\n", report.classified_count));
    out.push_str(&format!("  HTTP-live:           {}\n", report.http_live));
    out.push_str(&format!("  Queued for JS:       {}\n", report.needs_js));
    out.push_str(&format!("  JS-live:             {}\n", report.js_live));
    out.push_str(&format!("  Live total:          {}\n", report.live_urls.len()));
    out.push_str("\n# Timing:\n");
    out.push_str(&format!("  HTTP phase: {:.1}s\n", report.http_elapsed.as_secs_f64()));
    out.push_str(&format!("  JS phase:   {:.1}s\n", report.js_elapsed.as_secs_f64()));
    out.push_str(&format!("  Total:      {:.1}s\n", report.total_elapsed.as_secs_f64()));
    out.push_str(&format!(
        "\nCompleted {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    out
}
