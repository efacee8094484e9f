//! Upload progress map for polling clients.
//!
//! Entries expire through a periodic TTL sweep, not per-request checks, so
//! abandoned uploads cannot leak status entries forever.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use utoipa::ToSchema;
use uuid::Uuid;

/// Client-facing progress snapshot.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadStatus {
    pub percent: u8,
    pub message: String,
}

#[derive(Debug, Clone)]
struct StatusEntry {
    percent: u8,
    message: String,
    updated_at: Instant,
}

/// Mutex-guarded progress map keyed by client-supplied upload id.
pub struct UploadStatusMap {
    entries: Mutex<HashMap<Uuid, StatusEntry>>,
    ttl: Duration,
}

impl UploadStatusMap {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn set(&self, upload_id: Uuid, percent: u8, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                upload_id,
                StatusEntry {
                    percent,
                    message: message.to_string(),
                    updated_at: Instant::now(),
                },
            );
        }
    }

    pub fn get(&self, upload_id: Uuid) -> Option<UploadStatus> {
        let entries = self.entries.lock().ok()?;
        entries.get(&upload_id).map(|e| UploadStatus {
            percent: e.percent,
            message: e.message.clone(),
        })
    }

    /// Drop entries older than the TTL; called by the periodic cleanup task.
    pub fn cleanup(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            let ttl = self.ttl;
            let before = entries.len();
            entries.retain(|_, e| e.updated_at.elapsed() < ttl);
            let removed = before - entries.len();
            if removed > 0 {
                tracing::debug!(removed, remaining = entries.len(), "Expired upload status entries");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let map = UploadStatusMap::new(Duration::from_secs(60));
        let id = Uuid::new_v4();
        map.set(id, 40, "Uploading video");
        let status = map.get(id).unwrap();
        assert_eq!(status.percent, 40);
        assert_eq!(status.message, "Uploading video");
        assert!(map.get(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_cleanup_expires_old_entries() {
        let map = UploadStatusMap::new(Duration::from_millis(1));
        let id = Uuid::new_v4();
        map.set(id, 100, "done");
        std::thread::sleep(Duration::from_millis(5));
        map.cleanup();
        assert!(map.get(id).is_none());
        assert!(map.is_empty());
    }

    #[test]
    fn test_cleanup_keeps_fresh_entries() {
        let map = UploadStatusMap::new(Duration::from_secs(60));
        let id = Uuid::new_v4();
        map.set(id, 10, "starting");
        map.cleanup();
        assert!(map.get(id).is_some());
    }
}
