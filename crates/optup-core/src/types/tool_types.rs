//! Tool registry types
//!
//! Every managed tool is described by plain data. Tools that ship as release
//! archives differ only in their feed code and naming templates; git-based
//! tools only need to know where their checkout lives.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Command-line sentinel selecting every registered tool
pub const ALL_TOOLS: &str = "ALL";

/// Placeholder substituted in profile directory templates
const VERSION_PLACEHOLDER: &str = "{version}";

/// Immutable configuration for one managed tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ToolDescriptor {
    /// Short name: install directory probe, symlink name and CLI argument
    pub name: String,

    /// How the tool is distributed
    #[serde(flatten)]
    pub kind: ToolKind,
}

/// Distribution channel of a tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ToolKind {
    /// Versioned archives published on the release feed
    Release(ReleaseSource),

    /// A git checkout updated in place
    Git(GitSource),
}

/// Release feed parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleaseSource {
    /// Feed product code (e.g. `CL`)
    pub code: String,

    /// Settings directory template, e.g. `.CLion{version}`
    #[serde(default)]
    pub profile_dir: Option<String>,

    /// Platform key override; defaults to the runtime platform
    #[serde(default)]
    pub platform: Option<String>,
}

/// Git checkout parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitSource {
    /// Checkout location; defaults to `<install-root>/<name>`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl ToolDescriptor {
    /// Create a release-feed tool
    pub fn release(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ToolKind::Release(ReleaseSource {
                code: code.into(),
                profile_dir: None,
                platform: None,
            }),
        }
    }

    /// Create a git-based tool
    pub fn git(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ToolKind::Git(GitSource::default()),
        }
    }

    /// Set the profile directory template (release tools only)
    pub fn with_profile_dir(mut self, template: impl Into<String>) -> Self {
        if let ToolKind::Release(source) = &mut self.kind {
            source.profile_dir = Some(template.into());
        }
        self
    }

    /// Launcher script name inside an installation's `bin/` directory
    pub fn launcher_name(&self) -> String {
        format!("{}.sh", self.name)
    }

    /// Render the profile directory name for an installed `<major>.<minor>`
    pub fn render_profile_dir(&self, version: &str) -> Option<String> {
        match &self.kind {
            ToolKind::Release(ReleaseSource {
                profile_dir: Some(template),
                ..
            }) => Some(template.replace(VERSION_PLACEHOLDER, version)),
            _ => None,
        }
    }

    /// Checkout directory of a git-based tool
    pub fn git_checkout(&self, install_root: &Path) -> Option<PathBuf> {
        match &self.kind {
            ToolKind::Git(source) => Some(
                source
                    .path
                    .clone()
                    .unwrap_or_else(|| install_root.join(&self.name)),
            ),
            ToolKind::Release(_) => None,
        }
    }
}

/// The set of tools known to this installation, in registry order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRegistry {
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    /// Build a registry, rejecting duplicate names
    pub fn new(tools: Vec<ToolDescriptor>) -> Result<Self> {
        let registry = Self { tools };
        registry.validate()?;
        Ok(registry)
    }

    /// Ensure every tool has a unique, non-empty name
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for tool in &self.tools {
            if tool.name.trim().is_empty() {
                return Err(Error::invalid_config("tool name must not be empty"));
            }
            if tool.name == ALL_TOOLS {
                return Err(Error::invalid_config(format!(
                    "tool name '{}' is reserved",
                    ALL_TOOLS
                )));
            }
            if let ToolKind::Release(source) = &tool.kind {
                if source.code.trim().is_empty() {
                    return Err(Error::invalid_config(format!(
                        "tool '{}' has an empty feed code",
                        tool.name
                    )));
                }
            }
            if !seen.insert(tool.name.as_str()) {
                return Err(Error::invalid_config(format!(
                    "duplicate tool name '{}'",
                    tool.name
                )));
            }
        }
        Ok(())
    }

    /// Look up a tool by short name
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Registered short names, in registry order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|t| t.name.as_str())
    }

    /// Overlay another registry: same-named tools are replaced, new ones appended
    pub fn merge(mut self, overlay: ToolRegistry) -> Self {
        for tool in overlay.tools {
            match self.tools.iter_mut().find(|t| t.name == tool.name) {
                Some(existing) => *existing = tool,
                None => self.tools.push(tool),
            }
        }
        self
    }

    /// Resolve command-line names to descriptors
    ///
    /// `ALL` expands to the whole registry. Repeated names are dropped after
    /// their first occurrence.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<&ToolDescriptor>> {
        if names.iter().any(|n| n.as_ref() == ALL_TOOLS) {
            return Ok(self.tools.iter().collect());
        }

        let mut seen = HashSet::new();
        let mut selected = Vec::new();
        for name in names {
            let name = name.as_ref();
            if !seen.insert(name) {
                continue;
            }
            let tool = self
                .get(name)
                .ok_or_else(|| Error::unknown_tool(name, self.names()))?;
            selected.push(tool);
        }
        Ok(selected)
    }
}
