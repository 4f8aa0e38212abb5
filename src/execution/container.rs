//! Container execution strategy.
//!
//! Wraps the payload command in an ephemeral container run:
//!
//! ```text
//! docker run --rm -i --name agent-bench-<id> [-e K=V]...
//!     -v <exercise>:/workspace -w /workspace
//!     [-v <exercise>/<test>:/workspace/<test>:ro]... <image> <payload argv>...
//! ```
//!
//! Protected test files are mounted read-only on top of the writable
//! workspace mount. They are placed before the image name so the runtime
//! parses them as run options rather than as payload arguments.
//!
//! Killing the runtime client does not stop the container, so every run
//! gets a unique name and a `<runtime> rm -f <name>` cleanup command.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ExecutionContext, PreparedCommand};
use crate::agents::CoreCommand;

/// Fixed mount point of the exercise inside the container.
pub const CONTAINER_WORKSPACE: &str = "/workspace";

/// Default container runtime binary.
pub const DEFAULT_RUNTIME: &str = "docker";

/// Prefix of generated container names.
pub const CONTAINER_NAME_PREFIX: &str = "agent-bench-";

/// Volume mount configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMount {
    /// Host path.
    pub host_path: PathBuf,
    /// Container path.
    pub container_path: PathBuf,
    /// Whether the mount is read-only.
    pub readonly: bool,
}

impl VolumeMount {
    /// Creates a new read-write volume mount.
    pub fn new(host: impl Into<PathBuf>, container: impl Into<PathBuf>) -> Self {
        Self {
            host_path: host.into(),
            container_path: container.into(),
            readonly: false,
        }
    }

    /// Creates a read-only volume mount.
    pub fn readonly(host: impl Into<PathBuf>, container: impl Into<PathBuf>) -> Self {
        Self {
            host_path: host.into(),
            container_path: container.into(),
            readonly: true,
        }
    }

    /// Returns the `-v` argument value.
    pub fn to_docker_mount(&self) -> String {
        let ro = if self.readonly { ":ro" } else { "" };
        format!(
            "{}:{}{}",
            self.host_path.display(),
            self.container_path.display(),
            ro
        )
    }
}

/// Runs commands inside an ephemeral container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStrategy {
    /// Runtime binary (`docker`, `podman`, ...).
    pub runtime: String,
    /// Image (or container identifier) to run.
    pub image: String,
}

impl ContainerStrategy {
    /// Creates a strategy for `image` using the default runtime.
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            runtime: DEFAULT_RUNTIME.to_string(),
            image: image.into(),
        }
    }

    /// Sets the runtime binary.
    pub fn with_runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime = runtime.into();
        self
    }

    /// Prepares `core` for container execution.
    ///
    /// The container process owns its environment, so no cwd or env is set
    /// on the host-side spawn.
    pub fn prepare(&self, core: &CoreCommand, ctx: &ExecutionContext) -> PreparedCommand {
        let name = format!("{}{}", CONTAINER_NAME_PREFIX, Uuid::new_v4().simple());
        PreparedCommand::new(self.run_args(&name, core, ctx)).with_cleanup(vec![
            self.runtime.clone(),
            "rm".to_string(),
            "-f".to_string(),
            name,
        ])
    }

    fn run_args(&self, name: &str, core: &CoreCommand, ctx: &ExecutionContext) -> Vec<String> {
        let workspace = ctx.absolute_path();
        let mut args = vec![
            self.runtime.clone(),
            "run".to_string(),
            "--rm".to_string(),
            "-i".to_string(),
            "--name".to_string(),
            name.to_string(),
        ];

        // Only explicit values: a bare `-e KEY` would pull the host's value in.
        for (key, value) in &core.env {
            if value.is_empty() {
                continue;
            }
            args.push("-e".to_string());
            args.push(format!("{}={}", key, value));
        }

        args.push("-v".to_string());
        args.push(VolumeMount::new(&workspace, CONTAINER_WORKSPACE).to_docker_mount());
        args.push("-w".to_string());
        args.push(CONTAINER_WORKSPACE.to_string());

        for mount in protected_mounts(&workspace, ctx) {
            args.push("-v".to_string());
            args.push(mount.to_docker_mount());
        }

        args.push(self.image.clone());
        args.extend(core.argv.iter().cloned());
        args
    }
}

fn protected_mounts(workspace: &Path, ctx: &ExecutionContext) -> Vec<VolumeMount> {
    ctx.protected_test_files
        .iter()
        .map(|rel| {
            VolumeMount::readonly(
                workspace.join(rel),
                Path::new(CONTAINER_WORKSPACE).join(rel),
            )
        })
        .collect()
}
