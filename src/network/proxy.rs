//! Round-robin proxy rotation

use std::sync::atomic::{AtomicUsize, Ordering};

/// Rotates through a fixed proxy list, one proxy per request.
///
/// The cursor is owned here rather than in a global so that each client
/// rotates independently and tests can observe the order.
#[derive(Debug, Default)]
pub struct ProxyRotation {
    proxies: Vec<String>,
    cursor: AtomicUsize,
}

impl ProxyRotation {
    pub fn new(proxies: Vec<String>) -> Self {
        Self {
            proxies,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Next proxy in rotation, or `None` when requests go direct.
    pub fn next(&self) -> Option<&str> {
        if self.proxies.is_empty() {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.proxies.len();
        self.proxies.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }
}
