//! Per-machine workspace directories.
//!
//! A workspace lives at `<root>/<name>` while its machine is active. Creating
//! it is what serializes concurrent starts of the same machine. On teardown it
//! is moved under the removed root as `<name>`, `<name>.1`, `<name>.2`, ...
//! and never deleted.

// Standard library
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

// External crates
use tracing::{debug, info, warn};

// Internal imports
use dock_config::ManagerConfig;
use dock_core::{DockError, Result};
use dock_ports::ForwardedPort;

/// Boot payload file inside a workspace.
pub const PAYLOAD_FILE: &str = "cloud-init";
/// Symlink to the engine's log file for the container.
pub const CONSOLE_LOG: &str = "console.log";
/// Record of the forwarded port allocated to the container.
pub const PORT_FILE: &str = "forwarded-port";

const TEARDOWN_PENDING_SUFFIX: &str = ".teardown-pending";
const PENDING_PORT_KEY: &str = "port: ";

#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
    removed_root: PathBuf,
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\0')
    {
        return Err(DockError::InvalidInput(format!(
            "'{}' cannot be used as a workspace name",
            name
        )));
    }
    Ok(())
}

#[cfg(unix)]
fn create_single_dir(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().mode(0o755).create(path)
}

#[cfg(not(unix))]
fn create_single_dir(path: &Path) -> io::Result<()> {
    fs::DirBuilder::new().create(path)
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

fn exists_no_follow(path: &Path) -> Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(DockError::io(path, e)),
    }
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>, removed_root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            removed_root: removed_root.into(),
        }
    }

    pub fn from_config(config: &ManagerConfig) -> Self {
        Self::new(&config.containers_dir, &config.removed_containers_dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn removed_root(&self) -> &Path {
        &self.removed_root
    }

    /// Active path of the workspace `name`, whether or not it exists.
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn pending_marker(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}{}", name, TEARDOWN_PENDING_SUFFIX))
    }

    /// Creates `<root>/<name>`.
    ///
    /// An existing workspace, or one whose engine teardown is still pending,
    /// is reported as `InvalidInput`.
    pub fn create(&self, name: &str) -> Result<PathBuf> {
        check_name(name)?;
        if self.teardown_pending(name)? {
            return Err(DockError::InvalidInput(format!(
                "workspace {} is still occupied: container teardown is pending",
                name
            )));
        }

        fs::create_dir_all(&self.root).map_err(|e| DockError::io(&self.root, e))?;

        let path = self.path(name);
        match create_single_dir(&path) {
            Ok(()) => {
                debug!("Created workspace {}", path.display());
                Ok(path)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(DockError::InvalidInput(
                format!("workspace {} already exists", path.display()),
            )),
            Err(e) => Err(DockError::io(&path, e)),
        }
    }

    /// Moves the active workspace under the removed root and returns where it went.
    ///
    /// Returns `Ok(None)` when there is no active workspace, so a repeated
    /// teardown never loses data.
    pub fn relocate(&self, name: &str) -> Result<Option<PathBuf>> {
        check_name(name)?;
        let active = self.path(name);
        if !exists_no_follow(&active)? {
            debug!("No active workspace for {}, nothing to relocate", name);
            return Ok(None);
        }

        fs::create_dir_all(&self.removed_root).map_err(|e| DockError::io(&self.removed_root, e))?;

        let destination = self.reserve_removed_slot(name)?;
        match fs::rename(&active, &destination) {
            Ok(()) => {
                info!(
                    "Moved workspace {} to {}",
                    active.display(),
                    destination.display()
                );
                Ok(Some(destination))
            }
            Err(e) => {
                let _ = fs::remove_dir(&destination);
                if e.kind() == io::ErrorKind::NotFound {
                    debug!("Workspace {} disappeared before it could be moved", name);
                    Ok(None)
                } else {
                    Err(DockError::io(&active, e))
                }
            }
        }
    }

    /// Claims the first free `name`, `name.1`, `name.2`, ... under the removed root.
    ///
    /// The slot is claimed by creating it empty; the rename then replaces the
    /// empty directory.
    fn reserve_removed_slot(&self, name: &str) -> Result<PathBuf> {
        let mut suffix: u64 = 0;
        loop {
            let candidate = if suffix == 0 {
                self.removed_root.join(name)
            } else {
                self.removed_root.join(format!("{}.{}", name, suffix))
            };
            match create_single_dir(&candidate) {
                Ok(()) => return Ok(candidate),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => suffix += 1,
                Err(e) => return Err(DockError::io(&candidate, e)),
            }
        }
    }

    /// Whether a failed teardown still holds the name.
    pub fn teardown_pending(&self, name: &str) -> Result<bool> {
        exists_no_follow(&self.pending_marker(name))
    }

    /// Records that the engine may still run a container for `name`.
    ///
    /// `port` is kept in the marker so it can be released once a later
    /// teardown succeeds, after the workspace holding its record has moved.
    pub fn mark_teardown_pending(
        &self,
        name: &str,
        reason: &str,
        port: Option<ForwardedPort>,
    ) -> Result<PathBuf> {
        check_name(name)?;
        fs::create_dir_all(&self.root).map_err(|e| DockError::io(&self.root, e))?;
        let marker = self.pending_marker(name);
        let mut content = format!("{}\n", reason.trim());
        if let Some(port) = port {
            content.push_str(&format!("{}{}\n", PENDING_PORT_KEY, port));
        }
        fs::write(&marker, content).map_err(|e| DockError::io(&marker, e))?;
        warn!("Teardown of {} is pending: {}", name, reason);
        Ok(marker)
    }

    /// Port saved in the pending marker of `name`, if any.
    pub fn pending_port(&self, name: &str) -> Result<Option<ForwardedPort>> {
        check_name(name)?;
        let marker = self.pending_marker(name);
        let content = match fs::read_to_string(&marker) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DockError::io(&marker, e)),
        };
        content
            .lines()
            .find_map(|line| line.strip_prefix(PENDING_PORT_KEY))
            .map(str::parse)
            .transpose()
    }

    /// Removes the pending marker. Returns whether one existed.
    pub fn clear_teardown_pending(&self, name: &str) -> Result<bool> {
        check_name(name)?;
        let marker = self.pending_marker(name);
        match fs::remove_file(&marker) {
            Ok(()) => {
                debug!("Cleared pending teardown of {}", name);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DockError::io(&marker, e)),
        }
    }

    /// Links the engine's log file into the workspace as `console.log`.
    ///
    /// An existing link is an error; it is never overwritten.
    pub fn link_console_log(&self, workspace: &Path, log_path: &Path) -> Result<PathBuf> {
        let link = workspace.join(CONSOLE_LOG);
        symlink(log_path, &link).map_err(|e| DockError::io(&link, e))?;
        debug!("Linked {} to {}", link.display(), log_path.display());
        Ok(link)
    }

    /// Writes the forwarded-port record.
    pub fn record_port(&self, workspace: &Path, port: ForwardedPort) -> Result<PathBuf> {
        let path = workspace.join(PORT_FILE);
        let mut file = fs::File::create(&path).map_err(|e| DockError::io(&path, e))?;
        writeln!(file, "{}", port).map_err(|e| DockError::io(&path, e))?;
        Ok(path)
    }

    /// Reads the forwarded-port record, if the workspace has one.
    pub fn read_port(&self, workspace: &Path) -> Result<Option<ForwardedPort>> {
        let path = workspace.join(PORT_FILE);
        match fs::read_to_string(&path) {
            Ok(content) => content.parse().map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DockError::io(&path, e)),
        }
    }
}
