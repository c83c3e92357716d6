//! Per-profile session identity.
//!
//! Every ask request carries a `session_id` form field so the backend can
//! correlate calls from the same profile. The identifier is created lazily
//! on first use and then persisted in a [`SessionStore`] under
//! [`SESSION_KEY`]; it is never rotated by this crate.
//!
//! # Example
//!
//! ```
//! use agrigpt_client::{MemoryStore, SessionIdentity};
//!
//! let identity = SessionIdentity::new(MemoryStore::new());
//! let first = identity.get_or_create();
//! assert_eq!(identity.get_or_create(), first);
//! ```

use chrono::Utc;
use rand::rngs::{OsRng, StdRng};
use rand::{Rng, RngCore, SeedableRng};
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Storage key under which the session identifier is persisted.
pub const SESSION_KEY: &str = "agrigpt_session_id";

/// Key-value storage for client-local state.
///
/// Implementations must be safe to share between concurrent requests.
pub trait SessionStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Option<String>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a persistent store could not be written.
    fn set(&self, key: &str, value: &str) -> std::io::Result<()>;
}

/// In-process store. Contents live as long as the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> std::io::Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a small JSON object on disk.
///
/// The file is read on every lookup and rewritten on every write, which is
/// fine for the handful of keys it holds. An unreadable or corrupt file is
/// treated as empty.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// `<data dir>/agrigpt/session.json`, if the platform has a data directory.
    #[must_use]
    pub fn default_location() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("agrigpt").join("session.json"))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> HashMap<String, String> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read session store {}: {}", self.path.display(), e);
                return HashMap::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(
                "Ignoring corrupt session store {}: {}",
                self.path.display(),
                e
            );
            HashMap::new()
        })
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_entries().remove(key)
    }

    fn set(&self, key: &str, value: &str) -> std::io::Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut entries = self.read_entries();
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&entries)?;
        std::fs::write(&self.path, json)
    }
}

/// Hands out the session identifier, creating and persisting it on first use.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    store: Arc<dyn SessionStore>,
}

impl SessionIdentity {
    pub fn new(store: impl SessionStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    #[must_use]
    pub fn from_shared(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Returns the stored identifier, generating and persisting one if absent.
    ///
    /// Never fails. If persisting the new identifier fails, the failure is
    /// logged and the identifier is still returned; the next call will then
    /// generate a different one.
    ///
    /// Two near-simultaneous first calls may both generate an identifier;
    /// the last write wins and later reads are consistent.
    #[must_use]
    pub fn get_or_create(&self) -> String {
        if let Some(existing) = self.store.get(SESSION_KEY).filter(|id| !id.is_empty()) {
            return existing;
        }

        let id = generate_session_id();
        match self.store.set(SESSION_KEY, &id) {
            Ok(()) => tracing::debug!("Created session identifier {id}"),
            Err(e) => tracing::warn!("Failed to persist session identifier: {e}"),
        }
        id
    }

    /// Returns the stored identifier without creating one.
    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.store.get(SESSION_KEY).filter(|id| !id.is_empty())
    }
}

/// Generates a new session identifier.
///
/// Uses a random (v4) UUID drawn from the operating system's secure random
/// source. If that source is unavailable, falls back to a millisecond
/// timestamp plus a pseudo-random base-36 suffix; the fallback is much
/// weaker against collisions between profiles created in the same
/// millisecond.
#[must_use]
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; 16];
    match OsRng.try_fill_bytes(&mut bytes) {
        Ok(()) => uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .to_string(),
        Err(e) => {
            tracing::warn!("Secure random source unavailable, using fallback session id: {e}");
            let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
            let mut rng = StdRng::seed_from_u64(fallback_seed(millis));
            fallback_session_id(millis, &mut rng)
        }
    }
}

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const FALLBACK_SUFFIX_LEN: usize = 9;

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Mixes the timestamp with sub-millisecond time, the process id and a
/// per-process counter so fallback ids from one process never share a seed.
fn fallback_seed(millis: u64) -> u64 {
    let nanos = Utc::now().timestamp_subsec_nanos();
    let count = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);
    millis.rotate_left(17) ^ u64::from(nanos) ^ (u64::from(std::process::id()) << 32) ^ count
}

pub(crate) fn fallback_session_id<R: Rng>(millis: u64, rng: &mut R) -> String {
    let suffix: String = (0..FALLBACK_SUFFIX_LEN)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect();
    format!("{}-{}", to_base36(millis), suffix)
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
