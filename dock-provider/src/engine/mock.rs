//! In-memory engine for tests.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use dock_core::CommandError;

use super::{ContainerEngine, EngineContainer, EngineError, RunSpec};

#[derive(Debug, Default)]
struct MockState {
    containers: Vec<EngineContainer>,
    next_id: u64,
    clock: i64,
    calls: Vec<String>,
    runs: Vec<RunSpec>,
    fail_run: bool,
    silent_run: bool,
    fail_list: bool,
    fail_stop: bool,
    fail_remove: bool,
}

/// Engine whose containers live in a vector.
///
/// `run` creates a container with the requested image, hostname and
/// command, and a creation time later than any existing one.
#[derive(Debug)]
pub struct MockEngine {
    state: Mutex<MockState>,
    log_root: PathBuf,
}

fn failure(command: &str, message: &str) -> EngineError {
    EngineError::Command(CommandError::Failed {
        command: format!("mock {}", command),
        code: Some(1),
        output: message.to_string(),
    })
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                clock: 1000,
                ..MockState::default()
            }),
            log_root: PathBuf::from("/var/lib/docker/containers"),
        }
    }

    pub fn with_containers(containers: Vec<EngineContainer>) -> Self {
        let engine = Self::new();
        for container in containers {
            engine.push_container(container);
        }
        engine
    }

    pub fn with_log_root(mut self, log_root: impl Into<PathBuf>) -> Self {
        self.log_root = log_root.into();
        self
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push_container(&self, container: EngineContainer) {
        let mut state = self.lock();
        state.clock = state.clock.max(container.created);
        state.containers.push(container);
    }

    pub fn containers(&self) -> Vec<EngineContainer> {
        self.lock().containers.clone()
    }

    /// Every primitive invoked so far, as `"<op> <arg>"`.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Every spec handed to `run`, failed calls included.
    pub fn runs(&self) -> Vec<RunSpec> {
        self.lock().runs.clone()
    }

    pub fn set_fail_run(&self, fail: bool) {
        self.lock().fail_run = fail;
    }

    /// Make `run` succeed without creating anything.
    pub fn set_silent_run(&self, silent: bool) {
        self.lock().silent_run = silent;
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.lock().fail_list = fail;
    }

    pub fn set_fail_stop(&self, fail: bool) {
        self.lock().fail_stop = fail;
    }

    pub fn set_fail_remove(&self, fail: bool) {
        self.lock().fail_remove = fail;
    }
}

impl ContainerEngine for MockEngine {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn run(&self, spec: &RunSpec) -> Result<(), EngineError> {
        let mut state = self.lock();
        state.calls.push(format!("run {}", spec.image));
        state.runs.push(spec.clone());
        if state.fail_run {
            return Err(failure("run", "unable to find image"));
        }
        if state.silent_run {
            return Ok(());
        }

        state.next_id += 1;
        state.clock += 1;
        let container = EngineContainer {
            id: format!("mock{:08x}", state.next_id),
            name: spec.hostname.clone(),
            image: spec.image.clone(),
            created: state.clock,
            status: "Up 1 second".to_string(),
            command: spec.command.join(" "),
        };
        state.containers.push(container);
        Ok(())
    }

    fn list_containers(&self) -> Result<Vec<EngineContainer>, EngineError> {
        let mut state = self.lock();
        state.calls.push("list".to_string());
        if state.fail_list {
            return Err(failure("ps", "cannot connect to the engine"));
        }
        Ok(state.containers.clone())
    }

    fn stop(&self, id: &str) -> Result<(), EngineError> {
        let mut state = self.lock();
        state.calls.push(format!("stop {}", id));
        if state.fail_stop {
            return Err(failure("stop", "container did not stop"));
        }
        match state.containers.iter_mut().find(|c| c.id == id) {
            Some(container) => {
                container.status = "Exited (0) 1 second ago".to_string();
                Ok(())
            }
            None => Err(failure("stop", "no such container")),
        }
    }

    fn remove(&self, id: &str) -> Result<(), EngineError> {
        let mut state = self.lock();
        state.calls.push(format!("remove {}", id));
        if state.fail_remove {
            return Err(failure("rm", "device or resource busy"));
        }
        let before = state.containers.len();
        state.containers.retain(|c| c.id != id);
        if state.containers.len() == before {
            return Err(failure("rm", "no such container"));
        }
        Ok(())
    }

    fn log_path(&self, id: &str) -> PathBuf {
        self.log_root.join(id).join(format!("{}-json.log", id))
    }
}
