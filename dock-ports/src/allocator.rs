use std::fmt;
use std::sync::Arc;

use dock_config::{PortSettings, ReleasePolicy};
use dock_core::{DockError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::counter::{AtomicCounter, FileCounter};

/// A host port reserved for one container's inbound service mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForwardedPort(u16);

impl ForwardedPort {
    /// Accepts counter values that are valid TCP ports.
    pub fn new(value: i64) -> Result<Self> {
        u16::try_from(value)
            .ok()
            .filter(|port| *port != 0)
            .map(ForwardedPort)
            .ok_or_else(|| {
                DockError::AllocationUnavailable(format!(
                    "counter value {} is not a usable port",
                    value
                ))
            })
    }

    pub fn get(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for ForwardedPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ForwardedPort {
    type Err = DockError;

    fn from_str(s: &str) -> Result<Self> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| DockError::InvalidInput(format!("'{}' is not a port number", s.trim())))?;
        ForwardedPort::new(value)
    }
}

/// Hands out forwarded ports from a shared counter key.
#[derive(Clone)]
pub struct PortAllocator {
    counter: Arc<dyn AtomicCounter>,
    key: String,
    policy: ReleasePolicy,
}

impl fmt::Debug for PortAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortAllocator")
            .field("key", &self.key)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl PortAllocator {
    pub fn new(counter: Arc<dyn AtomicCounter>, key: impl Into<String>, policy: ReleasePolicy) -> Self {
        Self {
            counter,
            key: key.into(),
            policy,
        }
    }

    /// File-backed allocator described by the port settings.
    pub fn from_settings(settings: &PortSettings) -> Self {
        let counter = FileCounter::new(&settings.state_file, settings.seed);
        Self::new(Arc::new(counter), settings.counter_key.clone(), settings.release)
    }

    pub fn policy(&self) -> ReleasePolicy {
        self.policy
    }

    /// Reserves a port. Every call goes to the backend.
    pub fn allocate(&self) -> Result<ForwardedPort> {
        if self.policy == ReleasePolicy::Recycle {
            if let Some(value) = self.counter.take_released(&self.key)? {
                let port = ForwardedPort::new(value)?;
                info!("Reusing released port {}", port);
                return Ok(port);
            }
        }

        let value = self.counter.decrement(&self.key)?;
        let port = ForwardedPort::new(value)?;
        debug!("Allocated port {} from counter {}", port, self.key);
        Ok(port)
    }

    /// Hands `port` back when the policy allows it. Returns whether it was released.
    pub fn release(&self, port: ForwardedPort) -> Result<bool> {
        match self.policy {
            ReleasePolicy::Monotonic => {
                debug!("Keeping port {} consumed under the monotonic policy", port);
                Ok(false)
            }
            ReleasePolicy::Recycle => {
                self.counter.release(&self.key, i64::from(port.get()))?;
                info!("Released port {}", port);
                Ok(true)
            }
        }
    }
}
