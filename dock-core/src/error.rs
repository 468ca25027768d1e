//! Error taxonomy shared by every dock crate.
//!
//! Each orchestrator step fails with one specific [`ErrorKind`]. Failures are
//! wrapped in [`DockError::Step`] so that the machine name and the step that
//! broke travel with the error, while [`DockError::kind`] still reports the
//! underlying kind.

use std::fmt::{self, Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DockError>;

/// The chained operations a start, stop or list call is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    TagMachine,
    CreateWorkspace,
    WritePayload,
    AllocatePort,
    RunContainer,
    ResolveContainer,
    LinkConsoleLog,
    PostConfigure,
    ResolveForStop,
    StopContainer,
    RemoveContainer,
    RelocateWorkspace,
    ReleasePort,
    ListContainers,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::TagMachine => "tag machine",
            Step::CreateWorkspace => "create workspace",
            Step::WritePayload => "write boot payload",
            Step::AllocatePort => "allocate forwarded port",
            Step::RunContainer => "run container",
            Step::ResolveContainer => "resolve container id",
            Step::LinkConsoleLog => "link console log",
            Step::PostConfigure => "post-boot configuration",
            Step::ResolveForStop => "resolve container for stop",
            Step::StopContainer => "stop container",
            Step::RemoveContainer => "remove container",
            Step::RelocateWorkspace => "relocate workspace",
            Step::ReleasePort => "release forwarded port",
            Step::ListContainers => "list containers",
        }
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat classification of a [`DockError`], independent of step wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    Io,
    AllocationUnavailable,
    Config,
    ContainerCreationFailed,
    NotFound,
    ContainerTeardownFailed,
    PostConfigurationFailed,
    AlreadyStopped,
    EngineQuery,
    Aggregate,
}

#[derive(Error, Debug)]
pub enum DockError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Port allocation unavailable: {0}")]
    AllocationUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Container creation failed: {0}")]
    ContainerCreationFailed(String),

    #[error("Container not found: {0}")]
    NotFound(String),

    #[error("Container teardown failed: {0}")]
    ContainerTeardownFailed(String),

    #[error("Post-boot configuration failed: {0}")]
    PostConfigurationFailed(String),

    #[error("Container {0} is already stopped")]
    AlreadyStopped(String),

    #[error("Container engine query failed: {0}")]
    EngineQuery(String),

    #[error("{step} failed for {machine}: {source}")]
    Step {
        machine: String,
        step: Step,
        #[source]
        source: Box<DockError>,
    },

    #[error("{}", join_errors(.0))]
    Aggregate(Vec<DockError>),
}

fn join_errors(errors: &[DockError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl DockError {
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        DockError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Wraps `self` with the machine name and the step that produced it.
    pub fn in_step(self, machine: impl Into<String>, step: Step) -> Self {
        DockError::Step {
            machine: machine.into(),
            step,
            source: Box::new(self),
        }
    }

    /// Kind of the innermost error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DockError::Step { source, .. } => source.kind(),
            DockError::InvalidInput(_) => ErrorKind::InvalidInput,
            DockError::Io { .. } => ErrorKind::Io,
            DockError::AllocationUnavailable(_) => ErrorKind::AllocationUnavailable,
            DockError::Config(_) => ErrorKind::Config,
            DockError::ContainerCreationFailed(_) => ErrorKind::ContainerCreationFailed,
            DockError::NotFound(_) => ErrorKind::NotFound,
            DockError::ContainerTeardownFailed(_) => ErrorKind::ContainerTeardownFailed,
            DockError::PostConfigurationFailed(_) => ErrorKind::PostConfigurationFailed,
            DockError::AlreadyStopped(_) => ErrorKind::AlreadyStopped,
            DockError::EngineQuery(_) => ErrorKind::EngineQuery,
            DockError::Aggregate(_) => ErrorKind::Aggregate,
        }
    }

    /// The error with every [`DockError::Step`] wrapper peeled off.
    pub fn root(&self) -> &DockError {
        let mut current = self;
        while let DockError::Step { source, .. } = current {
            current = source;
        }
        current
    }

    /// Outermost step this error is attributed to.
    pub fn step(&self) -> Option<Step> {
        match self {
            DockError::Step { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Machine name recorded by the outermost step wrapper.
    pub fn machine(&self) -> Option<&str> {
        match self {
            DockError::Step { machine, .. } => Some(machine),
            _ => None,
        }
    }

    /// Members of an aggregate, or `self` alone.
    pub fn errors(&self) -> Vec<&DockError> {
        match self.root() {
            DockError::Aggregate(errors) => errors.iter().collect(),
            _ => vec![self],
        }
    }

    /// Collapses collected errors: none is success, one is returned as is.
    pub fn aggregate(mut errors: Vec<DockError>) -> Result<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(DockError::Aggregate(errors)),
        }
    }
}

/// Attaches step context to a fallible result.
pub trait StepContext<T> {
    fn in_step(self, machine: &str, step: Step) -> Result<T>;
}

impl<T> StepContext<T> for Result<T> {
    fn in_step(self, machine: &str, step: Step) -> Result<T> {
        self.map_err(|e| e.in_step(machine, step))
    }
}

impl From<serde_yaml_ng::Error> for DockError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        DockError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for DockError {
    fn from(err: serde_json::Error) -> Self {
        DockError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_sees_through_step_wrappers() {
        let err = DockError::NotFound("x:latest".into())
            .in_step("machine-1", Step::ResolveContainer)
            .in_step("machine-1", Step::RunContainer);

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.step(), Some(Step::RunContainer));
        assert_eq!(err.machine(), Some("machine-1"));
    }

    #[test]
    fn test_step_display_names_machine_and_step() {
        let err = DockError::AllocationUnavailable("backend unreachable".into())
            .in_step("machine-0", Step::AllocatePort);

        let message = err.to_string();
        assert!(message.contains("allocate forwarded port"));
        assert!(message.contains("machine-0"));
        assert!(message.contains("backend unreachable"));
    }

    #[test]
    fn test_aggregate_collapses_single_error() {
        assert!(DockError::aggregate(Vec::new()).is_ok());

        let single = DockError::aggregate(vec![DockError::InvalidInput("bad".into())]);
        assert_eq!(single.unwrap_err().kind(), ErrorKind::InvalidInput);

        let many = DockError::aggregate(vec![
            DockError::ContainerTeardownFailed("stop".into()),
            DockError::io("/tmp/x", io::Error::from(io::ErrorKind::PermissionDenied)),
        ])
        .unwrap_err();
        assert_eq!(many.kind(), ErrorKind::Aggregate);
        assert_eq!(many.errors().len(), 2);
        assert!(many.to_string().contains("; "));
    }

    #[test]
    fn test_io_error_carries_path() {
        let err = DockError::io("/var/lib/dock/containers/m", io::Error::from(io::ErrorKind::NotFound));
        assert!(err.to_string().contains("/var/lib/dock/containers/m"));
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
