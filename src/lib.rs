//! Builds a production release and ships its static assets into a GitHub
//! Pages `docs/` directory.
pub mod api;
pub mod config;
pub mod deployer;
pub mod errors;
pub mod preview;
pub mod release;
pub mod vfs;

pub use api::{deploy, deploy_with, preview, DeployOptions, DocshipError};
pub use config::{AssetEntry, AssetKind, BuildCommand, DeployConfig};
