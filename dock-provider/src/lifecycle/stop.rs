use tracing::{debug, info, warn};

use dock_config::ReleasePolicy;
use dock_core::{DockError, Result, Step, StepContext};
use dock_ports::ForwardedPort;

use super::DockManager;
use crate::engine::EngineContainer;
use crate::instance::Instance;
use crate::resolver::{containers_named, find_by_engine_id};

impl DockManager {
    /// Stops and removes the container, then relocates its workspace.
    ///
    /// Engine teardown and relocation are both attempted; their errors are
    /// reported together. A failed listing counts as a failed teardown, so the
    /// workspace still moves and a pending marker is left behind. Every
    /// container carrying the instance name is torn down when no cached id
    /// matches. An instance with no container left is `AlreadyStopped` once
    /// any lingering workspace has been moved away.
    pub fn stop(&self, instance: &Instance) -> Result<()> {
        let name = instance.name();
        info!("Stopping {}", name);

        let mut errors = Vec::new();
        let mut teardown_ok = true;
        let mut found = false;
        match self.engine.list_containers() {
            Ok(containers) => {
                let targets = containers_for(instance, &containers);
                found = !targets.is_empty();
                for container in targets {
                    if let Err(e) = self.teardown(name, container) {
                        teardown_ok = false;
                        errors.push(e);
                    }
                }
            }
            Err(e) => {
                teardown_ok = false;
                errors.push(
                    DockError::EngineQuery(e.to_string()).in_step(name, Step::ResolveForStop),
                );
            }
        }

        // Read before the marker is cleared, it may be the only record left.
        let port = if self.ports.policy() == ReleasePolicy::Recycle {
            self.recorded_port(name)
        } else {
            None
        };

        let pending = if teardown_ok {
            self.workspaces.clear_teardown_pending(name).map(|_| ())
        } else {
            self.workspaces
                .mark_teardown_pending(name, "engine teardown failed", port)
                .map(|_| ())
        };
        if let Err(e) = pending {
            errors.push(e.in_step(name, Step::RelocateWorkspace));
        }

        let relocated = match self.workspaces.relocate(name) {
            Ok(Some(destination)) => {
                debug!("{} workspace kept at {}", name, destination.display());
                true
            }
            Ok(None) => true,
            Err(e) => {
                errors.push(e.in_step(name, Step::RelocateWorkspace));
                false
            }
        };
        if teardown_ok && relocated {
            if let Some(port) = port {
                if let Err(e) = self.release_port(port) {
                    errors.push(e.in_step(name, Step::ReleasePort));
                }
            }
        }

        DockError::aggregate(errors)?;
        if !found {
            return Err(
                DockError::AlreadyStopped(name.to_string()).in_step(name, Step::ResolveForStop)
            );
        }
        info!("Stopped {}", name);
        Ok(())
    }

    /// Stops then removes one engine container.
    fn teardown(&self, name: &str, container: &EngineContainer) -> Result<()> {
        debug!("{} resolved to engine container {}", name, container.id);
        self.engine
            .stop(&container.id)
            .map_err(|e| DockError::ContainerTeardownFailed(format!("stop {}: {}", container.id, e)))
            .in_step(name, Step::StopContainer)?;
        self.engine
            .remove(&container.id)
            .map_err(|e| {
                DockError::ContainerTeardownFailed(format!("remove {}: {}", container.id, e))
            })
            .in_step(name, Step::RemoveContainer)
    }

    /// Port recorded for `name`, from its workspace or its pending marker.
    fn recorded_port(&self, name: &str) -> Option<ForwardedPort> {
        let recorded = match self.workspaces.read_port(&self.workspaces.path(name)) {
            Ok(None) => self.workspaces.pending_port(name),
            other => other,
        };
        match recorded {
            Ok(port) => port,
            Err(e) => {
                warn!("Not releasing the port of {}: {}", name, e);
                None
            }
        }
    }
}

/// Containers backing `instance`: the one with its cached id, otherwise all
/// of those with its name.
fn containers_for<'c>(
    instance: &Instance,
    containers: &'c [EngineContainer],
) -> Vec<&'c EngineContainer> {
    let name = instance.name();
    if let Some(id) = instance.engine_id() {
        if let Some(container) = find_by_engine_id(containers, id) {
            return vec![container];
        }
        debug!("No container with id {} for {}, matching by name", id, name);
    }
    containers_named(containers, name)
}
