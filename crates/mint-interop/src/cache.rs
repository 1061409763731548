// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 mint contributors

//! Latest-value cache shared between the receive worker and its owner.
//!
//! # Architecture
//!
//! ```text
//!   worker thread                       consumer thread
//!   recv(topic, payload)                receive_copy("ModelPose")
//!        |                                     |
//!        v                                     v
//!   lock -> map[topic] = payload        lock -> map.get(topic).cloned()
//!        unlock                                unlock
//! ```
//!
//! The lock is held for one map operation only, never across I/O. Entries
//! are overwritten, never removed; the map lives as long as its receiver.

use parking_lot::Mutex;
use std::collections::HashMap;

/// Most recent payload per exact topic.
#[derive(Debug, Default)]
pub struct LatestValueCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl LatestValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the entry for `topic`.
    pub fn store(&self, topic: String, payload: Vec<u8>) {
        self.entries.lock().insert(topic, payload);
    }

    /// Copy of the latest payload for `topic`.
    pub fn get(&self, topic: &str) -> Option<Vec<u8>> {
        self.entries.lock().get(topic).cloned()
    }

    /// Snapshot of the topics seen so far, sorted.
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.entries.lock().keys().cloned().collect();
        topics.sort();
        topics
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_latest_wins() {
        let cache = LatestValueCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.get("A"), None);

        cache.store("A".into(), b"1".to_vec());
        cache.store("A".into(), b"2".to_vec());
        cache.store("B".into(), b"3".to_vec());

        assert_eq!(cache.get("A").as_deref(), Some(&b"2"[..]));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.topics(), vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_exact_key_match() {
        let cache = LatestValueCache::new();
        cache.store("CameraView".into(), b"x".to_vec());
        assert_eq!(cache.get("Camera"), None);
        assert_eq!(cache.get("CameraViewRelative"), None);
    }

    #[test]
    fn test_concurrent_store_and_get() {
        let cache = Arc::new(LatestValueCache::new());
        let writer = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..10_000u32 {
                    let payload = format!("{{\"value\":{}}}", i).repeat(8);
                    cache.store("T".into(), payload.into_bytes());
                }
            })
        };

        for _ in 0..10_000 {
            if let Some(payload) = cache.get("T") {
                let text = String::from_utf8(payload).expect("utf8");
                let first = &text[..text.len() / 8];
                assert_eq!(text, first.repeat(8));
            }
        }

        writer.join().expect("writer");
        assert_eq!(cache.len(), 1);
    }
}
