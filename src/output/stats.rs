//! Crawl statistics and their terminal rendering

use crate::output::CrawlReport;
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlStats {
    /// URLs dequeued and resolved, successful or not
    pub visited_count: usize,

    /// URLs whose document was fetched and processed
    pub succeeded_count: usize,

    /// URLs that were skipped or exhausted their retries
    pub failed_count: usize,

    /// Non-document URLs encountered but never fetched
    pub files_found: usize,

    /// URLs still queued when the crawl stopped
    pub queue_size_remaining: usize,

    /// Number of batches dispatched
    pub batches: usize,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlStats {
    pub fn duration_seconds(&self) -> f64 {
        (self.finished_at - self.started_at)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Percentage of visited URLs that succeeded
    pub fn success_rate(&self) -> f64 {
        if self.visited_count == 0 {
            0.0
        } else {
            (self.succeeded_count as f64 / self.visited_count as f64) * 100.0
        }
    }
}

/// Renders a report in the format printed by [`print_report`]
pub fn render_report(report: &CrawlReport) -> String {
    let stats = &report.stats;
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "=== Crawl Report ===\n");

    let _ = writeln!(out, "Successful pages ({}):", report.succeeded.len());
    for url in &report.succeeded {
        let _ = writeln!(out, "  {}", url);
    }
    let _ = writeln!(out);

    if !report.failed.is_empty() {
        let _ = writeln!(out, "Failed pages ({}):", report.failed.len());
        for url in &report.failed {
            let _ = writeln!(out, "  {}", url);
        }
        let _ = writeln!(out);
    }

    if !report.files.is_empty() {
        let _ = writeln!(out, "Files found ({}):", report.files.len());
        for file in &report.files {
            let _ = writeln!(out, "  {}", file);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Statistics:");
    let _ = writeln!(out, "  Visited: {}", stats.visited_count);
    let _ = writeln!(out, "  Succeeded: {}", stats.succeeded_count);
    let _ = writeln!(out, "  Failed: {}", stats.failed_count);
    let _ = writeln!(out, "  Files found: {}", stats.files_found);
    let _ = writeln!(out, "  Queue remaining: {}", stats.queue_size_remaining);
    let _ = writeln!(out, "  Batches: {}", stats.batches);
    let _ = writeln!(out, "  Duration: {:.1}s", stats.duration_seconds());
    let _ = writeln!(
        out,
        "\nSuccess Rate: {:.1}% ({} / {} pages successfully processed)",
        stats.success_rate(),
        stats.succeeded_count,
        stats.visited_count
    );

    out
}

/// Prints a report to stdout
pub fn print_report(report: &CrawlReport) {
    print!("{}", render_report(report));
}
