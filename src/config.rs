use std::{
    fmt, fs,
    path::{Component, Path, PathBuf},
};

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

use crate::errors::{FileOperation, IoError};

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Io(#[from] IoError),

    #[error("Unable to parse toml file at '{path}': {source}")]
    #[diagnostic(code(docship::config::parse_toml), help("Review toml file"))]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {reason}")]
    #[diagnostic(code(docship::config::invalid))]
    Invalid { reason: String },
}

/// True when joining `path` onto a root cannot leave that root.
fn stays_inside(path: &Path) -> bool {
    path.components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
        && path.components().any(|component| matches!(component, Component::Normal(_)))
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Directory,
    File,
}
impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory => write!(f, "directory"),
            Self::File => write!(f, "file"),
        }
    }
}

/// One copy task. `source` is relative to [`DeployConfig::source_root`] and
/// `destination` to [`DeployConfig::dest_root`].
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: AssetKind,
    /// Optional entries are skipped when their source is absent.
    #[serde(default)]
    pub optional: bool,
    /// Human name used in progress output.
    pub label: String,
}
impl AssetEntry {
    pub fn new(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        kind: AssetKind,
        optional: bool,
        label: &str,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            kind,
            optional,
            label: label.to_string(),
        }
    }
}

/// The external release build, run before any asset is copied.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}
impl Default for BuildCommand {
    fn default() -> Self {
        Self {
            program: "pnpm".to_string(),
            args: vec!["run".to_string(), "release".to_string()],
        }
    }
}
impl fmt::Display for BuildCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DeployConfig {
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
    pub build: BuildCommand,
    pub assets: Vec<AssetEntry>,
    /// File name of the marker written into `dest_root` after every deploy.
    pub marker: String,
}
impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("resources/public"),
            dest_root: PathBuf::from("docs"),
            build: BuildCommand::default(),
            assets: vec![
                AssetEntry::new("css", "css", AssetKind::Directory, false, "CSS files"),
                AssetEntry::new("fonts", "fonts", AssetKind::Directory, true, "Fonts"),
                AssetEntry::new(
                    "js/rounding.js",
                    "js/rounding.js",
                    AssetKind::File,
                    true,
                    "JavaScript assets",
                ),
                AssetEntry::new("favicon.svg", "favicon.svg", AssetKind::File, true, "Favicon"),
            ],
            marker: ".nojekyll".to_string(),
        }
    }
}
impl DeployConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path)
            .map_err(|error| IoError::new(FileOperation::Read, path.to_path_buf(), error))?;

        let parsed = DeployConfig::from_toml_str(&content).map_err(|error| match error {
            ConfigError::ParseToml { source, .. } => ConfigError::ParseToml {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;

        log::debug!("loaded deploy config from {}", path.display());

        Ok(parsed)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: DeployConfig =
            toml::from_str(content).map_err(|error| ConfigError::ParseToml {
                path: PathBuf::new(),
                source: error,
            })?;

        parsed.validate()?;

        Ok(parsed)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.build.program.trim().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "build program must not be empty".to_string(),
            });
        }

        let marker = Path::new(&self.marker);
        if !stays_inside(marker) || marker.components().count() != 1 {
            return Err(ConfigError::Invalid {
                reason: format!("marker '{}' must be a plain file name", self.marker),
            });
        }

        for asset in &self.assets {
            if asset.source.as_os_str().is_empty() || asset.destination.as_os_str().is_empty() {
                return Err(ConfigError::Invalid {
                    reason: format!("asset '{}' needs a source and a destination", asset.label),
                });
            }

            for (role, path) in [("source", &asset.source), ("destination", &asset.destination)] {
                if !stays_inside(path) {
                    return Err(ConfigError::Invalid {
                        reason: format!(
                            "asset '{}' {} '{}' must be relative and must not contain '..'",
                            asset.label,
                            role,
                            path.display()
                        ),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn marker_path(&self) -> PathBuf {
        self.dest_root.join(&self.marker)
    }
}
