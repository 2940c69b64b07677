//! Deduplicated FIFO frontier with the crawl's visited set
//!
//! The frontier is the only place the queue and the visited set change.
//! Every operation runs as one critical section, so concurrent enqueues from
//! in-flight fetches and a concurrent `dequeue_batch` are linearizable, and a
//! URL discovered twice is dispatched at most once.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

/// How a visited URL resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitStatus {
    /// Dequeued, fetch not resolved yet
    InFlight,
    /// Fetched and its document processed
    Succeeded,
    /// Skipped or exhausted its retries
    Failed,
}

/// Frozen view of the frontier, used for reporting
#[derive(Debug, Clone, Default)]
pub struct FrontierSnapshot {
    /// Succeeded URLs in dequeue order
    pub succeeded: Vec<Url>,
    /// Failed (or still in-flight) URLs in dequeue order
    pub failed: Vec<Url>,
    /// Non-document URLs seen but never fetched
    pub files: Vec<String>,
    /// URLs still waiting in the queue
    pub queued: usize,
}

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<Url>,
    queued: HashSet<String>,
    visited: HashMap<String, VisitStatus>,
    visit_order: Vec<Url>,
    files: BTreeSet<String>,
}

/// Breadth-first frontier bounded by a page budget
#[derive(Debug)]
pub struct Frontier {
    max_pages: usize,
    state: Mutex<FrontierState>,
}

impl Frontier {
    /// Creates an empty frontier that will hand out at most `max_pages` URLs
    pub fn new(max_pages: usize) -> Self {
        Self {
            max_pages,
            state: Mutex::new(FrontierState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `url` to the tail unless it is already visited or queued
    ///
    /// `url` must already be normalized. Returns true if it was appended.
    pub fn enqueue(&self, url: Url) -> bool {
        let mut state = self.lock();
        let key = url.as_str();

        if state.visited.contains_key(key) || state.queued.contains(key) {
            return false;
        }

        state.queued.insert(key.to_string());
        state.queue.push_back(url);
        true
    }

    /// Removes up to `n` URLs from the head, bounded by the remaining budget
    ///
    /// Each returned URL is marked visited (in flight) before the lock is
    /// released, so a rediscovery during the batch is a no-op.
    pub fn dequeue_batch(&self, n: usize) -> Vec<Url> {
        let mut state = self.lock();
        let remaining = self.max_pages.saturating_sub(state.visited.len());
        let take = n.min(remaining).min(state.queue.len());

        let mut batch = Vec::with_capacity(take);
        for _ in 0..take {
            let Some(url) = state.queue.pop_front() else {
                break;
            };
            let key = url.as_str().to_string();
            state.queued.remove(&key);
            state.visited.insert(key, VisitStatus::InFlight);
            state.visit_order.push(url.clone());
            batch.push(url);
        }

        batch
    }

    /// Records the terminal outcome of a dispatched URL
    ///
    /// Ignored for URLs that were never dequeued.
    pub fn record_outcome(&self, url: &Url, succeeded: bool) {
        let mut state = self.lock();
        if let Some(status) = state.visited.get_mut(url.as_str()) {
            *status = if succeeded {
                VisitStatus::Succeeded
            } else {
                VisitStatus::Failed
            };
        }
    }

    /// Records a non-document URL that will never be fetched
    ///
    /// Returns true the first time a given URL is recorded.
    pub fn record_file(&self, url: &Url) -> bool {
        self.lock().files.insert(url.as_str().to_string())
    }

    pub fn status(&self, url: &Url) -> Option<VisitStatus> {
        self.lock().visited.get(url.as_str()).copied()
    }

    /// True once `url` has been queued or visited
    pub fn contains(&self, url: &Url) -> bool {
        let state = self.lock();
        state.visited.contains_key(url.as_str()) || state.queued.contains(url.as_str())
    }

    /// Number of URLs waiting in the queue
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// `max_pages - visited_count`, never negative
    pub fn remaining_budget(&self) -> usize {
        self.max_pages.saturating_sub(self.visited_count())
    }

    pub fn snapshot(&self) -> FrontierSnapshot {
        let state = self.lock();
        let (succeeded, failed) = state
            .visit_order
            .iter()
            .cloned()
            .partition(|url| state.visited.get(url.as_str()) == Some(&VisitStatus::Succeeded));

        FrontierSnapshot {
            succeeded,
            failed,
            files: state.files.iter().cloned().collect(),
            queued: state.queue.len(),
        }
    }
}
