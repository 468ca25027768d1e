//! Container lifecycle orchestration.
//!
//! Each start or stop is a fresh multi-step transaction with no intermediate
//! persisted state. Failures carry the machine name and the step that broke.
//! The manager holds no lock of its own: the workspace directory is the lease
//! for a machine name and the port counter backend is the only other shared
//! resource.

mod list;
mod start;
mod stop;

use std::sync::Arc;
use std::time::Duration;

use dock_config::ManagerConfig;
use dock_core::Result;
use dock_ports::{ForwardedPort, PortAllocator};

use crate::boot::BootStrategy;
use crate::engine::ContainerEngine;
use crate::instance::Instance;
use crate::payload::{renderer_for, BootConfigRenderer};
use crate::workspace::WorkspaceManager;

pub use start::Started;

pub struct DockManager {
    config: ManagerConfig,
    engine: Arc<dyn ContainerEngine>,
    ports: PortAllocator,
    workspaces: WorkspaceManager,
    renderer: Arc<dyn BootConfigRenderer>,
    strategy: BootStrategy,
    resolve_delay: Duration,
}

impl std::fmt::Debug for DockManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DockManager")
            .field("namespace", &self.config.namespace())
            .field("engine", &self.engine.name())
            .field("ports", &self.ports)
            .field("workspaces", &self.workspaces)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

impl DockManager {
    /// Validates `config` and derives the boot strategy and renderer from it.
    pub fn new(
        config: ManagerConfig,
        engine: Arc<dyn ContainerEngine>,
        ports: PortAllocator,
    ) -> Result<Self> {
        config.validate()?;
        let strategy = BootStrategy::from_config(&config)?;
        let renderer = renderer_for(config.boot.initializer);
        let workspaces = WorkspaceManager::from_config(&config);
        let resolve_delay = config.engine.resolve_delay();
        Ok(Self {
            config,
            engine,
            ports,
            workspaces,
            renderer,
            strategy,
            resolve_delay,
        })
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn BootConfigRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_strategy(mut self, strategy: BootStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_resolve_delay(mut self, delay: Duration) -> Self {
        self.resolve_delay = delay;
        self
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn workspaces(&self) -> &WorkspaceManager {
        &self.workspaces
    }

    pub fn engine(&self) -> &dyn ContainerEngine {
        self.engine.as_ref()
    }

    pub fn strategy(&self) -> &BootStrategy {
        &self.strategy
    }

    /// Label used in errors that concern the whole manager rather than one machine.
    fn manager_label(&self) -> String {
        match self.config.namespace() {
            Some(ns) => format!("{}-*", ns),
            None => "*".to_string(),
        }
    }

    fn post_boot_address(&self) -> &str {
        &self.config.boot.host_address
    }

    fn release_port(&self, port: ForwardedPort) -> Result<bool> {
        self.ports.release(port)
    }
}

impl crate::ContainerManager for DockManager {
    fn start_container(
        &self,
        machine_id: &str,
        image: &str,
        boot: &crate::payload::MachineConfig,
        network: &crate::engine::NetworkConfig,
    ) -> Result<Started> {
        self.start(machine_id, image, boot, network)
    }

    fn stop_container(&self, instance: &Instance) -> Result<()> {
        self.stop(instance)
    }

    fn list_containers(&self) -> Result<Vec<Instance>> {
        self.list()
    }
}
