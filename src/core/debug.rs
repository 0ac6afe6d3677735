//! Planner statistics

use std::collections::VecDeque;
use std::time::Duration;

/// One completed (or failed) search
#[derive(Debug, Clone, Copy)]
struct SearchSample {
    duration: Duration,
    expanded: usize,
    found: bool,
}

/// Rolling statistics over recent path searches
#[derive(Debug)]
pub struct PlannerStats {
    /// Search history for averaging
    samples: VecDeque<SearchSample>,
    /// Maximum samples to keep
    max_samples: usize,
    /// Average search time in milliseconds
    avg_search_ms: f32,
    /// Longest search time in milliseconds
    max_search_ms: f32,
    /// Average nodes expanded per search
    avg_expanded: f32,
    /// Total searches run
    total_searches: u64,
    /// Total searches that found no path
    total_failures: u64,
}

impl PlannerStats {
    /// Create a new stats tracker
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(64),
            max_samples: 64,
            avg_search_ms: 0.0,
            max_search_ms: 0.0,
            avg_expanded: 0.0,
            total_searches: 0,
            total_failures: 0,
        }
    }

    /// Record one search
    pub fn record_search(&mut self, duration: Duration, expanded: usize, found: bool) {
        self.total_searches += 1;
        if !found {
            self.total_failures += 1;
        }

        if self.samples.len() >= self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(SearchSample {
            duration,
            expanded,
            found,
        });

        self.update_stats();
    }

    fn update_stats(&mut self) {
        if self.samples.is_empty() {
            return;
        }

        let mut total = Duration::ZERO;
        let mut max = Duration::ZERO;
        let mut expanded = 0usize;

        for sample in &self.samples {
            total += sample.duration;
            max = max.max(sample.duration);
            expanded += sample.expanded;
        }

        let count = self.samples.len() as f32;
        self.avg_search_ms = total.as_secs_f32() * 1000.0 / count;
        self.max_search_ms = max.as_secs_f32() * 1000.0;
        self.avg_expanded = expanded as f32 / count;
    }

    /// Average search time in milliseconds
    pub fn avg_search_ms(&self) -> f32 {
        self.avg_search_ms
    }

    /// Longest recent search time in milliseconds
    pub fn max_search_ms(&self) -> f32 {
        self.max_search_ms
    }

    /// Average expanded nodes per recent search
    pub fn avg_expanded(&self) -> f32 {
        self.avg_expanded
    }

    /// Total searches run
    pub fn total_searches(&self) -> u64 {
        self.total_searches
    }

    /// Total searches that ended without a path
    pub fn total_failures(&self) -> u64 {
        self.total_failures
    }

    /// Whether the most recent search found a path
    pub fn last_found(&self) -> Option<bool> {
        self.samples.back().map(|s| s.found)
    }

    /// Get a formatted stats string
    pub fn format_stats(&self) -> String {
        format!(
            "Searches: {} ({} failed) | Avg: {:.2}ms (max: {:.2}) | Expanded: {:.1}",
            self.total_searches,
            self.total_failures,
            self.avg_search_ms,
            self.max_search_ms,
            self.avg_expanded
        )
    }
}

impl Default for PlannerStats {
    fn default() -> Self {
        Self::new()
    }
}
