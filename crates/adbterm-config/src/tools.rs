//! Discovery of the Android command-line tools.
//!
//! Each tool group is found either recursively under its configured folder
//! or on `PATH`. Missing tools are reported together.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::{ConfigError, ToolsConfig};

/// Tools shipped together in one SDK folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolGroup {
    pub name: &'static str,
    pub tools: &'static [&'static str],
    /// Environment variable naming the group's folder.
    pub env_key: &'static str,
}

pub const PLATFORM_TOOLS: ToolGroup = ToolGroup {
    name: "platform-tools",
    tools: &["adb"],
    env_key: "PLATFORMTOOLS_PATH",
};

pub const BUILD_TOOLS: ToolGroup = ToolGroup {
    name: "build-tools",
    tools: &["aapt"],
    env_key: "BUILDTOOLS_PATH",
};

pub const TOOL_GROUPS: [ToolGroup; 2] = [PLATFORM_TOOLS, BUILD_TOOLS];

impl ToolsConfig {
    /// Record `folder` as the location of `group`.
    pub fn set_folder(&mut self, group: &ToolGroup, folder: PathBuf) {
        if *group == BUILD_TOOLS {
            self.build_tools = Some(folder);
        } else {
            self.platform_tools = Some(folder);
        }
    }
}

/// Locate `tool` in any directory below `folder`, or on `PATH` when no
/// folder is given.
pub fn find_tool(tool: &str, folder: Option<&Path>) -> Option<PathBuf> {
    let Some(folder) = folder else {
        return which::which(tool).ok();
    };
    WalkDir::new(folder)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir())
        .find_map(|dir| which::which_in(tool, Some(dir.path()), dir.path()).ok())
}

/// Tools of `group` that cannot be found.
pub fn missing_tools(group: &ToolGroup, folder: Option<&Path>) -> Vec<&'static str> {
    group
        .tools
        .iter()
        .copied()
        .filter(|tool| find_tool(tool, folder).is_none())
        .collect()
}

/// A folder holding every tool of `group`. A file path is replaced by its
/// parent directory.
pub fn validate_folder(group: &ToolGroup, folder: &Path) -> Result<PathBuf, ConfigError> {
    if !folder.exists() {
        return Err(ConfigError::Validation {
            field: group.name.into(),
            reason: format!("{} does not exist", folder.display()),
        });
    }
    let folder = if folder.is_file() {
        folder.parent().unwrap_or(folder).to_path_buf()
    } else {
        folder.to_path_buf()
    };
    let missing = missing_tools(group, Some(&folder));
    if missing.is_empty() {
        Ok(folder)
    } else {
        Err(ConfigError::Validation {
            field: group.name.into(),
            reason: format!("missing {} in '{}'", missing.join(", "), folder.display()),
        })
    }
}

/// Absolute paths of the tools adbterm runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTools {
    pub adb: PathBuf,
    pub aapt: PathBuf,
}

pub fn resolve_tools(config: &ToolsConfig) -> Result<ResolvedTools, ConfigError> {
    let lookup = |tool: &str, folder: Option<&PathBuf>| {
        let found = find_tool(tool, folder.map(PathBuf::as_path));
        match &found {
            Some(path) => debug!(tool, path = %path.display(), "tool found"),
            None => info!(tool, "tool not found"),
        }
        found
    };
    let adb = lookup("adb", config.platform_tools.as_ref());
    let aapt = lookup("aapt", config.build_tools.as_ref());

    match (adb, aapt) {
        (Some(adb), Some(aapt)) => Ok(ResolvedTools { adb, aapt }),
        (adb, aapt) => {
            let tools = [("adb", adb.is_none()), ("aapt", aapt.is_none())]
                .into_iter()
                .filter_map(|(tool, missing)| missing.then(|| tool.to_owned()))
                .collect();
            Err(ConfigError::MissingTools { tools })
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::fs::PermissionsExt;

    use pretty_assertions::assert_eq;

    use super::*;

    fn executable(path: &Path) {
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(path, b"#!/bin/sh\n").expect("write");
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    }

    #[test]
    fn finds_tool_in_nested_folder() {
        let dir = tempfile::tempdir().expect("tempdir");
        let aapt = dir.path().join("build-tools/34.0.0/aapt");
        executable(&aapt);

        assert_eq!(find_tool("aapt", Some(dir.path())), Some(aapt));
        assert!(missing_tools(&BUILD_TOOLS, Some(dir.path())).is_empty());
        assert_eq!(missing_tools(&PLATFORM_TOOLS, Some(dir.path())), ["adb"]);
    }

    #[test]
    fn validate_folder_accepts_a_tool_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let adb = dir.path().join("platform-tools/adb");
        executable(&adb);

        let folder = validate_folder(&PLATFORM_TOOLS, &adb).expect("valid");
        assert_eq!(folder, dir.path().join("platform-tools"));
        assert!(validate_folder(&BUILD_TOOLS, &folder).is_err());
    }

    #[test]
    fn folders_are_recorded_per_group() {
        let mut config = ToolsConfig::default();
        config.set_folder(&BUILD_TOOLS, "/sdk/build-tools".into());
        config.set_folder(&PLATFORM_TOOLS, "/sdk/platform-tools".into());

        assert_eq!(config.build_tools, Some(PathBuf::from("/sdk/build-tools")));
        assert_eq!(config.platform_tools, Some(PathBuf::from("/sdk/platform-tools")));
    }

    #[test]
    fn every_missing_tool_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ToolsConfig {
            platform_tools: Some(dir.path().to_path_buf()),
            build_tools: Some(dir.path().to_path_buf()),
        };

        let Err(ConfigError::MissingTools { tools }) = resolve_tools(&config) else {
            panic!("expected missing tools");
        };
        assert_eq!(tools, ["adb", "aapt"]);
    }
}
