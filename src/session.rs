//! In-memory session registry with fixed-window expiry.
//!
//! One [`Session`] per in-flight crop interaction, keyed by an opaque
//! token. The store is the only process-wide state in the crate and is
//! injected into whatever needs it — there is no ambient global.
//!
//! Expiry is a fixed window from creation with no sliding renewal: an
//! abandoned session becomes unreachable the instant its window lapses,
//! which bounds memory under abandoned interactions. Expired entries are
//! dropped on access; [`SessionStore::sweep`] reaps the rest for callers
//! with a periodic tick.
//!
//! The store has no authorization logic. Matching `owner` against the
//! acting user is the caller's job before it mutates anything.

use crate::geometry::CropRegion;
use crate::media::{Dimensions, SourceFormat};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("unknown or expired session")]
    NotFound,
}

/// Opaque session token. Unique within a process, never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The unit of interactive state.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    /// The only identity allowed to mutate or confirm this session.
    pub owner: String,
    /// Raw source bytes, possibly the pre-upscaled replacement of the
    /// submitted input. Fixed after creation.
    pub source: Vec<u8>,
    /// Decoded dimensions of `source`. Fixed after creation.
    pub size: Dimensions,
    pub format: SourceFormat,
    /// The mutable crop selection.
    pub region: CropRegion,
    /// Pixel increment per move command.
    pub step: u32,
    created_at: Instant,
}

impl Session {
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

/// Concurrency-safe registry of live sessions.
pub struct SessionStore {
    ttl: Duration,
    counter: AtomicU64,
    inner: Mutex<HashMap<SessionId, Session>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            counter: AtomicU64::new(0),
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new session and return its token.
    pub fn create(
        &self,
        owner: &str,
        source: Vec<u8>,
        size: Dimensions,
        format: SourceFormat,
        region: CropRegion,
        step: u32,
    ) -> SessionId {
        let id = self.next_id(owner);
        let session = Session {
            id: id.clone(),
            owner: owner.to_string(),
            source,
            size,
            format,
            region,
            step,
            created_at: Instant::now(),
        };
        self.map().insert(id.clone(), session);
        id
    }

    /// Read from a session. Expired sessions behave as absent.
    pub fn with<R>(&self, id: &SessionId, f: impl FnOnce(&Session) -> R) -> Result<R, StoreError> {
        let mut map = self.map();
        if map.get(id).is_some_and(|s| s.is_expired(self.ttl)) {
            map.remove(id);
            return Err(StoreError::NotFound);
        }
        map.get(id).map(f).ok_or(StoreError::NotFound)
    }

    /// Apply a state transition atomically. Expired sessions behave as
    /// absent.
    pub fn mutate<R>(
        &self,
        id: &SessionId,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Result<R, StoreError> {
        let mut map = self.map();
        if map.get(id).is_some_and(|s| s.is_expired(self.ttl)) {
            map.remove(id);
            return Err(StoreError::NotFound);
        }
        map.get_mut(id).map(f).ok_or(StoreError::NotFound)
    }

    pub fn remove(&self, id: &SessionId) -> Option<Session> {
        self.map().remove(id)
    }

    /// Drop every expired session, returning how many were reaped.
    pub fn sweep(&self) -> usize {
        let mut map = self.map();
        let before = map.len();
        map.retain(|_, s| !s.is_expired(self.ttl));
        let reaped = before - map.len();
        if reaped > 0 {
            debug!(reaped, "swept expired sessions");
        }
        reaped
    }

    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }

    fn map(&self) -> std::sync::MutexGuard<'_, HashMap<SessionId, Session>> {
        self.inner.lock().expect("session map poisoned")
    }

    fn next_id(&self, owner: &str) -> SessionId {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let mut hasher = Sha256::new();
        hasher.update(n.to_le_bytes());
        hasher.update(nanos.to_le_bytes());
        hasher.update(owner.as_bytes());
        let digest = hasher.finalize();
        SessionId(digest[..8].iter().map(|b| format!("{b:02x}")).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: Dimensions = Dimensions { width: 1000, height: 500 };

    fn store_with_ttl(ttl: Duration) -> SessionStore {
        SessionStore::new(ttl)
    }

    fn create(store: &SessionStore, owner: &str) -> SessionId {
        store.create(
            owner,
            vec![1, 2, 3],
            SIZE,
            SourceFormat::Png,
            CropRegion { x: 133, y: 103, zoom: 1.0 },
            32,
        )
    }

    #[test]
    fn create_then_read_back() {
        let store = store_with_ttl(Duration::from_secs(60));
        let id = create(&store, "alice");

        let (owner, x) = store.with(&id, |s| (s.owner.clone(), s.region.x)).unwrap();
        assert_eq!(owner, "alice");
        assert_eq!(x, 133);
    }

    #[test]
    fn ids_are_unique_and_opaque() {
        let store = store_with_ttl(Duration::from_secs(60));
        let a = create(&store, "alice");
        let b = create(&store, "alice");
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 16);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn mutate_applies_transition() {
        let store = store_with_ttl(Duration::from_secs(60));
        let id = create(&store, "alice");

        store.mutate(&id, |s| s.region.x = 0).unwrap();
        assert_eq!(store.with(&id, |s| s.region.x).unwrap(), 0);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let store = store_with_ttl(Duration::from_secs(60));
        let id = create(&store, "alice");
        store.remove(&id);
        assert_eq!(store.with(&id, |_| ()), Err(StoreError::NotFound));
        assert_eq!(store.mutate(&id, |_| ()), Err(StoreError::NotFound));
    }

    #[test]
    fn expired_session_behaves_as_absent() {
        let store = store_with_ttl(Duration::ZERO);
        let id = create(&store, "alice");

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.with(&id, |_| ()), Err(StoreError::NotFound));
        // The access dropped the entry outright.
        assert!(store.is_empty());
    }

    #[test]
    fn sweep_reaps_only_expired() {
        let store = store_with_ttl(Duration::from_millis(20));
        let stale = create(&store, "alice");
        std::thread::sleep(Duration::from_millis(40));
        let fresh = create(&store, "bob");

        assert_eq!(store.sweep(), 1);
        assert_eq!(store.with(&stale, |_| ()), Err(StoreError::NotFound));
        assert!(store.with(&fresh, |_| ()).is_ok());
    }

    #[test]
    fn expiry_window_does_not_slide_on_access() {
        let store = store_with_ttl(Duration::from_millis(50));
        let id = create(&store, "alice");

        // Repeated activity must not extend the window.
        for _ in 0..4 {
            std::thread::sleep(Duration::from_millis(20));
            let _ = store.mutate(&id, |s| s.region.x += 1);
        }
        assert_eq!(store.with(&id, |_| ()), Err(StoreError::NotFound));
    }
}
