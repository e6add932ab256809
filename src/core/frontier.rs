//! Breadth-first frontier with visited tracking.
//!
//! A URL is admitted at most once: never while it is queued, and never after
//! it has been visited.

use std::collections::{HashSet, VecDeque};

/// FIFO queue of normalized URLs plus the set of URLs already visited
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<String>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    last_enqueued: Option<String>,
}

impl Frontier {
    /// Create an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a frontier holding a single seed URL
    pub fn seeded(seed: impl Into<String>) -> Self {
        let mut frontier = Self::new();
        frontier.enqueue(seed);
        frontier
    }

    /// Queue a URL unless it is already queued or visited.
    /// Returns whether it was admitted.
    pub fn enqueue(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.visited.contains(&url) || self.queued.contains(&url) {
            return false;
        }
        self.queued.insert(url.clone());
        self.queue.push_back(url.clone());
        self.last_enqueued = Some(url);
        true
    }

    /// Pop the oldest queued URL and mark it visited
    pub fn next_unvisited(&mut self) -> Option<String> {
        while let Some(url) = self.queue.pop_front() {
            self.queued.remove(&url);
            if self.visited.insert(url.clone()) {
                return Some(url);
            }
        }
        None
    }

    /// Record a URL as visited without popping it, e.g. the page a redirect
    /// landed on. It is dropped from the queue if waiting there. Returns
    /// whether it was newly marked.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        if self.queued.remove(url) {
            self.queue.retain(|queued| queued != url);
        }
        self.visited.insert(url.to_string())
    }

    /// Whether a URL has been visited
    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Whether a URL is waiting in the queue
    pub fn is_queued(&self, url: &str) -> bool {
        self.queued.contains(url)
    }

    /// Most recently admitted URL (it may since have been visited)
    pub fn last_enqueued(&self) -> Option<&str> {
        self.last_enqueued.as_deref()
    }

    /// Number of URLs visited so far
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of URLs waiting
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
