#![forbid(unsafe_code)]

//! Tunables for sticky instances.
//!
//! [`StickyConfig::default()`] reproduces the built-in behavior. With the
//! `config` feature the same struct loads from TOML or JSON:
//!
//! ```toml
//! # stickybox.toml
//! listen_wheel = true
//! observe_mutations = true
//! mutation_attributes = ["style", "class"]
//! initial_reserved_height = 1.0
//! ```
//!
//! ```rust,ignore
//! let config = StickyConfig::from_toml_file("stickybox.toml")?;
//! ```

#[cfg(feature = "config")]
use std::path::{Path, PathBuf};

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Scroll position assumed before the first evaluation. Large enough that the
/// first delta always reads as an upward scroll.
pub const INITIAL_SCROLL_SENTINEL: f64 = 999_999.0;

/// Height reserved for the wrapper before the first measurement.
pub const INITIAL_RESERVED_HEIGHT: f64 = 1.0;

/// Configuration shared by every instance mounted through one context.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct StickyConfig {
    /// Listen for mouse-wheel events on the scroll pane as well as scroll.
    pub listen_wheel: bool,

    /// Listen for window resize.
    pub listen_resize: bool,

    /// Observe the container subtree for layout-affecting mutations.
    pub observe_mutations: bool,

    /// Attribute names whose changes count as layout mutations.
    pub mutation_attributes: Vec<String>,

    /// Wrapper height before the first natural-height measurement.
    pub initial_reserved_height: f64,

    /// `latest_scroll_y` seed for new instances.
    pub initial_scroll_sentinel: f64,
}

impl Default for StickyConfig {
    fn default() -> Self {
        Self {
            listen_wheel: true,
            listen_resize: true,
            observe_mutations: true,
            mutation_attributes: vec!["style".to_owned(), "class".to_owned()],
            initial_reserved_height: INITIAL_RESERVED_HEIGHT,
            initial_scroll_sentinel: INITIAL_SCROLL_SENTINEL,
        }
    }
}

impl StickyConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = read_config_file(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = read_config_file(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Validate parameters. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.initial_reserved_height.is_finite() || self.initial_reserved_height < 0.0 {
            errors.push(format!(
                "initial_reserved_height must be finite and >= 0, got {}",
                self.initial_reserved_height
            ));
        }

        if !self.initial_scroll_sentinel.is_finite() {
            errors.push(format!(
                "initial_scroll_sentinel must be finite, got {}",
                self.initial_scroll_sentinel
            ));
        }

        if self.observe_mutations && self.mutation_attributes.is_empty() {
            errors.push("mutation_attributes must not be empty when observe_mutations is set".into());
        }

        if self.mutation_attributes.iter().any(|name| name.trim().is_empty()) {
            errors.push("mutation_attributes must not contain blank names".into());
        }

        errors
    }

    /// `self` if valid, otherwise a [`ConfigError::Validation`].
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Mutation observer options derived from this config.
    #[must_use]
    pub fn mutation_filter(&self) -> MutationFilter {
        MutationFilter {
            subtree: true,
            attributes: true,
            child_list: true,
            attribute_filter: self.mutation_attributes.clone(),
        }
    }
}

/// Options passed to the host's mutation observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationFilter {
    pub subtree: bool,
    pub attributes: bool,
    pub child_list: bool,
    pub attribute_filter: Vec<String>,
}

impl MutationFilter {
    /// Whether a change to `attribute` should be reported.
    #[must_use]
    pub fn matches_attribute(&self, attribute: &str) -> bool {
        self.attributes
            && (self.attribute_filter.is_empty()
                || self.attribute_filter.iter().any(|name| name == attribute))
    }
}

#[cfg(feature = "config")]
fn read_config_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Errors from loading a [`StickyConfig`].
///
/// Only [`ConfigError::Validation`] exists without the `config` feature.
#[derive(Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[cfg(feature = "config")]
    Read { path: PathBuf, source: std::io::Error },
    /// The TOML document does not describe a sticky config.
    #[cfg(feature = "config")]
    Toml(toml::de::Error),
    /// The JSON document does not describe a sticky config.
    #[cfg(feature = "config")]
    Json(serde_json::Error),
    /// Parsed values failed [`StickyConfig::validate`].
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "config")]
            Self::Read { path, source } => {
                write!(f, "cannot read sticky config {}: {source}", path.display())
            }
            #[cfg(feature = "config")]
            Self::Toml(e) => write!(f, "sticky config is not valid TOML: {e}"),
            #[cfg(feature = "config")]
            Self::Json(e) => write!(f, "sticky config is not valid JSON: {e}"),
            Self::Validation(errors) => {
                write!(f, "sticky config rejected: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(feature = "config")]
            Self::Read { source, .. } => Some(source),
            #[cfg(feature = "config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
