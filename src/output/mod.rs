//! Output module for crawl results
//!
//! This module handles:
//! - Assembling the final crawl report from the frontier
//! - Recording crawl statistics
//! - Rendering the report for the terminal

pub mod stats;

pub use stats::{print_report, render_report, CrawlStats};

use crate::crawler::FrontierSnapshot;
use chrono::{DateTime, Utc};
use url::Url;

/// What a finished crawl hands back to its caller
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlReport {
    /// Successfully processed URLs, in dispatch order
    pub succeeded: Vec<Url>,

    /// Attempted URLs that were skipped or exhausted, in dispatch order
    pub failed: Vec<Url>,

    /// Non-document URLs encountered but never fetched
    pub files: Vec<String>,

    pub stats: CrawlStats,
}

impl CrawlReport {
    /// Builds a report from the frontier's final state
    pub fn from_snapshot(
        snapshot: FrontierSnapshot,
        batches: usize,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let stats = CrawlStats {
            visited_count: snapshot.succeeded.len() + snapshot.failed.len(),
            succeeded_count: snapshot.succeeded.len(),
            failed_count: snapshot.failed.len(),
            files_found: snapshot.files.len(),
            queue_size_remaining: snapshot.queued,
            batches,
            started_at,
            finished_at,
        };

        Self {
            succeeded: snapshot.succeeded,
            failed: snapshot.failed,
            files: snapshot.files,
            stats,
        }
    }

    /// Every visited URL, successful or not, in dispatch order of each group
    pub fn visited(&self) -> impl Iterator<Item = &Url> {
        self.succeeded.iter().chain(self.failed.iter())
    }
}
