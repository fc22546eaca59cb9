//! In-process block transport for engine tests

use crate::node_client::BlockTransport;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Blocks keyed by `(node_url, path)`
#[derive(Default)]
pub struct MockTransport {
    blocks: Mutex<HashMap<(String, String), Bytes>>,
    down: Mutex<HashSet<String>>,
    /// Fail stores once this many have succeeded
    store_budget: Mutex<Option<usize>>,
    pub stores: AtomicUsize,
    pub fetches: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request to `node_url` fails
    pub fn take_down(&self, node_url: &str) {
        self.down.lock().insert(node_url.to_string());
    }

    pub fn fail_stores_after(&self, n: usize) {
        *self.store_budget.lock() = Some(n);
    }

    /// Flip one byte of a stored block
    pub fn corrupt(&self, node_url: &str, path: &str) {
        let mut blocks = self.blocks.lock();
        if let Some(data) = blocks.get_mut(&(node_url.to_string(), path.to_string())) {
            let mut bytes = data.to_vec();
            if let Some(first) = bytes.first_mut() {
                *first ^= 0xff;
            }
            *data = Bytes::from(bytes);
        }
    }

    pub fn get(&self, node_url: &str, path: &str) -> Option<Bytes> {
        self.blocks
            .lock()
            .get(&(node_url.to_string(), path.to_string()))
            .cloned()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.lock().len()
    }

    /// Paths held by one node
    pub fn paths_on(&self, node_url: &str) -> Vec<String> {
        let mut paths: Vec<String> = self
            .blocks
            .lock()
            .keys()
            .filter(|(url, _)| url == node_url)
            .map(|(_, path)| path.clone())
            .collect();
        paths.sort();
        paths
    }

    fn is_down(&self, node_url: &str) -> bool {
        self.down.lock().contains(node_url)
    }
}

#[async_trait]
impl BlockTransport for MockTransport {
    async fn store(&self, block: Bytes, node_url: &str, path: &str) -> bool {
        if self.is_down(node_url) {
            return false;
        }
        {
            let mut budget = self.store_budget.lock();
            match budget.as_mut() {
                Some(0) => return false,
                Some(n) => *n -= 1,
                None => {}
            }
        }
        self.stores.fetch_add(1, Ordering::SeqCst);
        self.blocks
            .lock()
            .insert((node_url.to_string(), path.to_string()), block);
        true
    }

    async fn fetch(&self, node_url: &str, path: &str) -> Option<Bytes> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.is_down(node_url) {
            return None;
        }
        self.get(node_url, path)
    }

    async fn health_check(&self, node_url: &str) -> bool {
        !self.is_down(node_url)
    }

    async fn delete_best_effort(&self, node_url: &str, path: &str) {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.is_down(node_url) {
            return;
        }
        self.blocks
            .lock()
            .remove(&(node_url.to_string(), path.to_string()));
    }
}
