//! Tree configuration presets

use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeError};

/// Bootstrap-style container class applied to a root element
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContainerKind {
    /// No container class
    None,
    /// `container`
    #[default]
    Fixed,
    /// `container-fluid`
    Fluid,
    Sm,
    Md,
    Lg,
    Xl,
    Xxl,
}

impl ContainerKind {
    /// CSS class for this kind, if any
    pub fn class_name(self) -> Option<&'static str> {
        match self {
            ContainerKind::None => None,
            ContainerKind::Fixed => Some("container"),
            ContainerKind::Fluid => Some("container-fluid"),
            ContainerKind::Sm => Some("container-sm"),
            ContainerKind::Md => Some("container-md"),
            ContainerKind::Lg => Some("container-lg"),
            ContainerKind::Xl => Some("container-xl"),
            ContainerKind::Xxl => Some("container-xxl"),
        }
    }
}

/// Per-root options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootConfig {
    /// Container class of the root element
    pub container: ContainerKind,
    /// Wrap the root's children in a `div.row`
    pub add_row: bool,
}

impl RootConfig {
    pub fn new(container: ContainerKind) -> Self {
        Self {
            container,
            add_row: false,
        }
    }

    /// Enable or disable the row wrapper
    pub fn with_row(mut self, add_row: bool) -> Self {
        self.add_row = add_row;
        self
    }
}

/// Configuration for a [`ComponentTree`](crate::ComponentTree)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Whether refreshes reach the patcher. When disabled, dirty state is
    /// still tracked and roots are patched once rendering is back on.
    pub rendering_enabled: bool,
    /// Defaults for roots created with [`Root::new`](crate::Root::new)
    pub root: RootConfig,
    /// Prefix of generated element ids
    pub id_prefix: String,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl TreeConfig {
    /// Standard configuration for general use
    pub fn standard() -> Self {
        Self {
            rendering_enabled: true,
            root: RootConfig::default(),
            id_prefix: "trellis".to_string(),
        }
    }

    /// Configuration for test runs: no container class, short id prefix
    pub fn testing() -> Self {
        Self {
            rendering_enabled: true,
            root: RootConfig::new(ContainerKind::None),
            id_prefix: "test".to_string(),
        }
    }

    /// Enable or disable patching
    pub fn with_rendering(mut self, enabled: bool) -> Self {
        self.rendering_enabled = enabled;
        self
    }

    /// Set the generated id prefix
    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }

    /// Set the default root options
    pub fn with_root(mut self, root: RootConfig) -> Self {
        self.root = root;
        self
    }

    /// Parse from TOML. Missing keys fall back to [`standard`](Self::standard).
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| TreeError::Config(e.to_string()))
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| TreeError::Config(e.to_string()))
    }
}
