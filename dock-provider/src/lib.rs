//! Container lifecycle library for dock machines.
//!
//! A machine is run as a container on a local engine. Its workspace directory
//! holds the boot payload and a link to the engine's log, and its forwarded
//! port comes from a shared counter. [`DockManager`] chains those pieces into
//! start, stop and list operations.

// Internal imports
use dock_core::Result;

// Re-export common types for convenience
pub use boot::{AnsibleConfigurator, BootCommand, BootStrategy, PostBootTarget, PostConfigurator};
pub use engine::{ContainerEngine, EngineContainer, EngineError, Mount, NetworkConfig, RunSpec};
pub use instance::Instance;
pub use lifecycle::{DockManager, Started};
pub use naming::{machine_tag, LogicalMachine};
pub use payload::{
    renderer_for, write_payload, AnsibleVarsRenderer, BootConfigRenderer, CloudConfigRenderer,
    MachineConfig,
};
pub use workspace::WorkspaceManager;

pub mod boot;
pub mod engine;
pub mod instance;
pub mod lifecycle;
pub mod naming;
pub mod payload;
pub mod resolver;
pub mod workspace;

#[cfg(test)]
mod lifecycle_tests;

/// Operations a container manager offers its callers.
pub trait ContainerManager {
    /// Creates, boots and configures the container for `machine_id`.
    fn start_container(
        &self,
        machine_id: &str,
        image: &str,
        boot: &MachineConfig,
        network: &NetworkConfig,
    ) -> Result<Started>;

    /// Tears the container down and retires its workspace.
    fn stop_container(&self, instance: &Instance) -> Result<()>;

    /// Running containers owned by this manager.
    fn list_containers(&self) -> Result<Vec<Instance>>;
}

/// Manager driving the local docker CLI, with a file-backed port counter.
#[cfg(feature = "docker")]
pub fn docker_manager(config: dock_config::ManagerConfig) -> Result<DockManager> {
    if !dock_core::command_stream::is_tool_installed(&config.engine.binary) {
        tracing::warn!("Container engine '{}' was not found in PATH", config.engine.binary);
    }
    let engine = std::sync::Arc::new(engine::docker::DockerEngine::from_settings(&config.engine));
    let ports = dock_ports::PortAllocator::from_settings(&config.ports);
    DockManager::new(config, engine, ports)
}
