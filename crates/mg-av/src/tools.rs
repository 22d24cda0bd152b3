//! External tool detection and management.
//!
//! The [`ToolRegistry`] discovers and caches the location of the external
//! engine (ffmpeg) and provides lookup methods for the rest of the crate.

use std::path::{Path, PathBuf};

use mg_core::config::ToolsConfig;
use serde::Serialize;

/// The engine executable the registry manages.
const FFMPEG: &str = "ffmpeg";

/// Configuration for a single external tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolConfig {
    /// Human-readable tool name (e.g. "ffmpeg").
    pub name: String,
    /// Resolved path to the executable.
    pub path: PathBuf,
}

/// Availability information for a tool, returned by [`ToolRegistry::check_all`].
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
    /// Whether the tool was found.
    pub available: bool,
    /// Version string (first line of `-version` output), if available.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Registry holding the discovered engine location.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    ffmpeg: Option<ToolConfig>,
}

impl ToolRegistry {
    /// Discover ffmpeg via `tools_config.ffmpeg_path`, or `PATH`.
    ///
    /// A configured path is used directly when it exists. Otherwise
    /// [`which::which`] locates the tool in `PATH`. A tool that is not found
    /// is left out of the registry.
    pub fn discover(tools_config: &ToolsConfig) -> Self {
        let resolved = match tools_config.ffmpeg_path.as_deref() {
            Some(p) if p.exists() => Some(p.to_path_buf()),
            Some(p) => {
                tracing::warn!(
                    "Configured {FFMPEG} path {} does not exist; searching PATH",
                    p.display()
                );
                which::which(FFMPEG).ok()
            }
            None => which::which(FFMPEG).ok(),
        };

        Self {
            ffmpeg: resolved.map(|path| ToolConfig {
                name: FFMPEG.to_string(),
                path,
            }),
        }
    }

    /// Return a reference to the [`ToolConfig`] for the given tool, or an
    /// [`mg_core::Error::Tool`] if the tool was not found during discovery.
    pub fn require(&self, name: &str) -> mg_core::Result<&ToolConfig> {
        self.ffmpeg
            .as_ref()
            .filter(|cfg| cfg.name == name)
            .ok_or_else(|| {
                mg_core::Error::tool(name, format!("{name} not found; is it installed and in PATH?"))
            })
    }

    /// Check the engine and return availability information.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        let info = match self.ffmpeg {
            Some(ref cfg) => ToolInfo {
                name: FFMPEG.to_string(),
                available: true,
                version: detect_version(&cfg.path),
                path: Some(cfg.path.clone()),
            },
            None => ToolInfo {
                name: FFMPEG.to_string(),
                available: false,
                version: None,
                path: None,
            },
        };
        vec![info]
    }
}

/// Run `<tool> -version` and return the first line of stdout.
fn detect_version(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path)
        .arg("-version")
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string())
}
