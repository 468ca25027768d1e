//! Atomic counter backends.

// Standard library
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

// External crates
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

// Internal imports
use dock_core::{DockError, Result};

/// A shared counter that can be decremented atomically across processes.
///
/// Implementations also hold a pool of released values for the recycle
/// release policy.
pub trait AtomicCounter: Send + Sync {
    /// Decrements the counter stored under `key` and returns the new value.
    fn decrement(&self, key: &str) -> Result<i64>;

    /// Returns `value` to the released pool of `key`.
    fn release(&self, key: &str, value: i64) -> Result<()>;

    /// Takes one value out of the released pool of `key`, if any.
    fn take_released(&self, key: &str) -> Result<Option<i64>>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CounterState {
    #[serde(default)]
    counters: BTreeMap<String, i64>,
    #[serde(default)]
    released: BTreeMap<String, Vec<i64>>,
}

impl CounterState {
    fn decrement(&mut self, key: &str, seed: i64) -> i64 {
        let value = self.counters.entry(key.to_string()).or_insert(seed);
        *value -= 1;
        *value
    }

    fn release(&mut self, key: &str, value: i64) {
        let pool = self.released.entry(key.to_string()).or_default();
        if !pool.contains(&value) {
            pool.push(value);
        }
    }

    fn take_released(&mut self, key: &str) -> Option<i64> {
        let pool = self.released.get_mut(key)?;
        let value = pool.pop();
        if pool.is_empty() {
            self.released.remove(key);
        }
        value
    }
}

const LOCK_RETRY_DELAY: Duration = Duration::from_millis(5);
const LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Counter persisted as JSON and guarded by an exclusive lock on a sibling
/// `.lock` file, so that every process on the host shares it.
#[derive(Debug, Clone)]
pub struct FileCounter {
    state_path: PathBuf,
    lock_path: PathBuf,
    seed: i64,
}

fn backend_error(path: &Path, action: &str, err: impl std::fmt::Display) -> DockError {
    DockError::AllocationUnavailable(format!(
        "failed to {} counter state {}: {}",
        action,
        path.display(),
        err
    ))
}

impl FileCounter {
    /// `seed` is the value a key starts from the first time it is decremented.
    pub fn new(state_path: impl Into<PathBuf>, seed: i64) -> Self {
        let state_path = state_path.into();
        let mut lock_name = state_path.file_name().unwrap_or_default().to_os_string();
        lock_name.push(".lock");
        let lock_path = state_path.with_file_name(lock_name);
        Self {
            state_path,
            lock_path,
            seed,
        }
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Read-modify-write of the state file under the exclusive lock.
    ///
    /// The lock lives on a separate file that is never renamed, so every
    /// caller contends on the same inode while the state file itself is
    /// replaced through a temporary file.
    fn atomic_update<T, F>(&self, update_fn: F) -> Result<T>
    where
        F: FnOnce(&mut CounterState) -> T,
    {
        if let Some(parent) = self.state_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| backend_error(parent, "create directory for", e))?;
            }
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|e| backend_error(&self.lock_path, "open lock for", e))?;

        let lock_start = Instant::now();
        let mut attempts: u32 = 0;
        loop {
            match lock_file.try_lock_exclusive() {
                Ok(()) => break,
                Err(e) => {
                    attempts += 1;
                    if lock_start.elapsed() > LOCK_TIMEOUT {
                        return Err(DockError::AllocationUnavailable(format!(
                            "timed out waiting for lock on {} after {} attempts: {}",
                            self.lock_path.display(),
                            attempts,
                            e
                        )));
                    }
                    std::thread::sleep(LOCK_RETRY_DELAY);
                }
            }
        }

        let _guard = scopeguard::guard((), |_| {
            let _ = lock_file.unlock();
        });

        let mut state: CounterState = match fs::read_to_string(&self.state_path) {
            Ok(content) if content.trim().is_empty() => CounterState::default(),
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| backend_error(&self.state_path, "parse", e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CounterState::default(),
            Err(e) => return Err(backend_error(&self.state_path, "read", e)),
        };

        let result = update_fn(&mut state);

        let json_content = serde_json::to_string_pretty(&state)
            .map_err(|e| backend_error(&self.state_path, "serialize", e))?;
        let temp_path = self.state_path.with_extension("json.tmp");
        fs::write(&temp_path, json_content)
            .map_err(|e| backend_error(&temp_path, "write", e))?;
        fs::rename(&temp_path, &self.state_path)
            .map_err(|e| backend_error(&self.state_path, "replace", e))?;

        Ok(result)
    }
}

impl AtomicCounter for FileCounter {
    fn decrement(&self, key: &str) -> Result<i64> {
        let seed = self.seed;
        let value = self.atomic_update(|state| state.decrement(key, seed))?;
        debug!("Counter {} decremented to {}", key, value);
        Ok(value)
    }

    fn release(&self, key: &str, value: i64) -> Result<()> {
        self.atomic_update(|state| state.release(key, value))
    }

    fn take_released(&self, key: &str) -> Result<Option<i64>> {
        self.atomic_update(|state| state.take_released(key))
    }
}

/// In-process counter, for tests and single-process use.
#[derive(Debug)]
pub struct MemoryCounter {
    seed: i64,
    state: Mutex<CounterState>,
}

impl MemoryCounter {
    pub fn new(seed: i64) -> Self {
        Self {
            seed,
            state: Mutex::new(CounterState::default()),
        }
    }

    /// Current value of every key that has been decremented.
    pub fn snapshot(&self) -> HashMap<String, i64> {
        match self.state.lock() {
            Ok(state) => state.counters.clone().into_iter().collect(),
            Err(_) => HashMap::new(),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut CounterState) -> T) -> Result<T> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| DockError::AllocationUnavailable("counter lock poisoned".to_string()))?;
        Ok(f(&mut state))
    }
}

impl AtomicCounter for MemoryCounter {
    fn decrement(&self, key: &str) -> Result<i64> {
        let seed = self.seed;
        self.with_state(|state| state.decrement(key, seed))
    }

    fn release(&self, key: &str, value: i64) -> Result<()> {
        self.with_state(|state| state.release(key, value))
    }

    fn take_released(&self, key: &str) -> Result<Option<i64>> {
        self.with_state(|state| state.take_released(key))
    }
}
