use tracing::{debug, warn};

use dock_core::{DockError, Result, Step, StepContext};

use super::DockManager;
use crate::instance::Instance;

impl DockManager {
    /// Running containers owned by this manager.
    ///
    /// With a namespace only names carrying its prefix are kept; without one
    /// every non-exited container is reported. Entries missing an id or a
    /// name are skipped.
    pub fn list(&self) -> Result<Vec<Instance>> {
        let containers = self
            .engine
            .list_containers()
            .map_err(|e| DockError::EngineQuery(e.to_string()))
            .in_step(&self.manager_label(), Step::ListContainers)?;

        let prefix = self.config.name_prefix();
        let mut instances = Vec::new();
        for container in containers {
            if container.id.is_empty() || container.name.is_empty() {
                warn!(
                    "Skipping container entry without id or name: {:?}",
                    container
                );
                continue;
            }
            if !container.name.starts_with(&prefix) {
                continue;
            }
            if container.is_exited() {
                debug!("Ignoring exited container {}", container.name);
                continue;
            }
            instances.push(Instance::new(container.name).with_engine_id(container.id));
        }
        debug!("Found {} running containers", instances.len());
        Ok(instances)
    }
}
