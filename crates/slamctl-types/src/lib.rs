use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of SLAM backends the supervisor knows how to launch.
///
/// Each method resolves to a static launch descriptor (the relative launch
/// target handed to the external launcher) and a process-name pattern used
/// by the shutdown broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingMethod {
    Gmapping,
    Cartographer,
    SlamToolbox,
}

impl MappingMethod {
    /// All supported methods, in declaration order.
    pub const ALL: [MappingMethod; 3] = [
        MappingMethod::Gmapping,
        MappingMethod::Cartographer,
        MappingMethod::SlamToolbox,
    ];

    /// The lowercase name the method parses from and displays as.
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingMethod::Gmapping => "gmapping",
            MappingMethod::Cartographer => "cartographer",
            MappingMethod::SlamToolbox => "slam_toolbox",
        }
    }

    /// Relative launch-target path handed to the external launcher.
    pub fn launch_file(&self) -> &'static str {
        match self {
            MappingMethod::Gmapping => "slam_gmapping/slam_gmapping.launch.py",
            MappingMethod::Cartographer => "wheeltec_cartographer/cartographer.launch.py",
            MappingMethod::SlamToolbox => "wheeltec_slam_toolbox/online_sync.launch.py",
        }
    }

    /// Command-line substring matched by the shutdown broadcast.
    pub fn kill_pattern(&self) -> &'static str {
        match self {
            MappingMethod::Gmapping => "slam_gmapping",
            MappingMethod::Cartographer => "cartographer_node",
            MappingMethod::SlamToolbox => "slam_toolbox_node",
        }
    }
}

impl std::fmt::Display for MappingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MappingMethod {
    type Err = SlamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gmapping" => Ok(MappingMethod::Gmapping),
            "cartographer" => Ok(MappingMethod::Cartographer),
            "slam_toolbox" => Ok(MappingMethod::SlamToolbox),
            other => Err(SlamError::UnknownMethod(other.to_string())),
        }
    }
}

/// A mapping process the supervisor spawned and still remembers.
///
/// Recorded in the process table at spawn time so that a later stop can
/// signal the exact pid instead of relying solely on the name-pattern
/// broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedProcess {
    pub pid: u32,
    pub log_file: PathBuf,
    pub started_at: DateTime<Utc>,
}

/// Uniform outcome of every public supervisor operation.
///
/// Operations never raise past their boundary; callers inspect [`success`]
/// rather than relying on control-flow signalling. Start results carry
/// `launch_file`/`config_file`; persist results carry `path`/`log_file`.
///
/// [`success`]: OperationResult::success
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}

impl OperationResult {
    /// A successful result with no operation-specific fields set.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            launch_file: None,
            config_file: None,
            path: None,
            log_file: None,
        }
    }

    /// A failed result with no operation-specific fields set.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            launch_file: None,
            config_file: None,
            path: None,
            log_file: None,
        }
    }

    pub fn with_launch_file(mut self, launch_file: impl Into<String>) -> Self {
        self.launch_file = Some(launch_file.into());
        self
    }

    pub fn with_config_file(mut self, config_file: impl Into<String>) -> Self {
        self.config_file = Some(config_file.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_log_file(mut self, log_file: impl Into<String>) -> Self {
        self.log_file = Some(log_file.into());
        self
    }
}

/// Internal failure taxonomy of the supervisor.
///
/// These never cross the public boundary as errors: the supervisor facade
/// converts each variant into a failed [`OperationResult`] whose message is
/// the variant's display text.
#[derive(Error, Debug)]
pub enum SlamError {
    #[error("Unknown mapping method: {0}")]
    UnknownMethod(String),

    #[error("Launch failed: {excerpt}")]
    LaunchFailure { excerpt: String },

    #[error("No child processes found - launch may have failed")]
    HealthCheckFailure,

    #[error("Map saver command failed:\n{log_tail}")]
    SaveCommandFailure { log_tail: String },

    #[error("Map save failed: expected output files not found")]
    MissingArtifacts,

    #[error("Operation cancelled before verification completed")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
