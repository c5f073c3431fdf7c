//! Durable FIFO work frontier
//!
//! The frontier is a queue of tree-page URLs backed by a line-oriented
//! text file: one URL per line, FIFO order, the in-flight URL (if any)
//! first. The file is read back in full at startup; a missing file is an
//! empty frontier. Pushes deduplicate against entries still pending so a
//! page discovered twice in one sweep is fetched once.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::io;
use std::path::PathBuf;

/// Durable FIFO queue of pending URLs
pub struct Frontier {
    queue: VecDeque<String>,
    pending: HashSet<String>,
    path: PathBuf,
}

impl Frontier {
    /// Loads the frontier from its queue file
    pub fn load(path: impl Into<PathBuf>) -> io::Result<Self> {
        let mut frontier = Self {
            queue: VecDeque::new(),
            pending: HashSet::new(),
            path: path.into(),
        };

        match fs::read_to_string(&frontier.path) {
            Ok(content) => {
                for line in content.lines() {
                    let url = line.trim();
                    if !url.is_empty() {
                        frontier.push(url.to_string());
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        Ok(frontier)
    }

    /// Appends a URL unless it is already pending; returns whether it was added
    pub fn push(&mut self, url: String) -> bool {
        if !self.pending.insert(url.clone()) {
            return false;
        }
        self.queue.push_back(url);
        true
    }

    /// Removes and returns the oldest pending URL
    pub fn pop(&mut self) -> Option<String> {
        let url = self.queue.pop_front()?;
        self.pending.remove(&url);
        Some(url)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Writes the queue back to its file, in-flight URL first
    pub fn persist(&self, in_flight: Option<&str>) -> io::Result<()> {
        let mut out = String::new();
        if let Some(url) = in_flight {
            out.push_str(url);
            out.push('\n');
        }
        for url in &self.queue {
            out.push_str(url);
            out.push('\n');
        }
        fs::write(&self.path, out)
    }
}
