use crate::{
    config::{self, DeployConfig},
    deployer::{self, DeployReport},
    preview::preview_as_tree,
    release::{self, ProcessBuilder, ReleaseBuilder},
    vfs::{FileSystem, OsFs},
};
use colored::Colorize;

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum DocshipError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Build(#[from] release::BuildError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Deploy(#[from] deployer::DeployerError),
}
impl DocshipError {
    /// A failed build passes its own exit code through; everything else exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Build(error) => error.exit_code(),
            _ => 1,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DeployOptions {
    pub skip_build: bool,
}

/// Runs the release build, then copies the configured assets into the
/// destination root and writes the marker file.
///
/// # Errors
///
/// Returns a [`DocshipError`] if:
///
/// - The release build cannot be started or exits unsuccessfully. Nothing is copied.
/// - A mandatory asset is missing.
/// - A directory or file cannot be listed, created, or copied.
pub fn deploy(config: &DeployConfig, options: DeployOptions) -> Result<DeployReport, DocshipError> {
    deploy_with(config, options, &ProcessBuilder, &mut OsFs)
}

/// [`deploy`] with caller-provided build runner and filesystem.
pub fn deploy_with<B: ReleaseBuilder, F: FileSystem>(
    config: &DeployConfig,
    options: DeployOptions,
    builder: &B,
    fs: &mut F,
) -> Result<DeployReport, DocshipError> {
    config.validate()?;

    if options.skip_build {
        log::info!("skipping release build");
    } else {
        println!("📦 Building production release...");
        builder.build(&config.build)?;
    }

    println!(
        "📁 Copying static assets to {}/...",
        config.dest_root.display()
    );

    let report = deployer::deploy_assets(fs, config)?;

    log::debug!(
        "{} files copied, {} directories ensured, skipped: {:?}",
        report.files_copied,
        report.directories_ensured,
        report.skipped
    );

    print_next_steps(config);

    Ok(report)
}

/// Prints what a deploy would do without building or writing anything.
pub fn preview<F: FileSystem>(config: &DeployConfig, fs: &F) -> Result<(), DocshipError> {
    config.validate()?;

    let plan = deployer::plan(fs, config)?;

    preview_as_tree(&plan, &config.dest_root);

    Ok(())
}

fn print_next_steps(config: &DeployConfig) {
    let dest = config.dest_root.display();

    println!(
        "\n✅ {}",
        "Build complete! Ready to deploy to GitHub Pages.".green()
    );
    println!("📝 Next steps:");
    println!("   1. git add {}/", dest);
    println!("   2. git commit -m \"Deploy to GitHub Pages\"");
    println!("   3. git push origin main");
    println!(
        "   4. Enable GitHub Pages in your repo settings (Pages -> Source -> main branch -> /{} folder)",
        dest
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::BuildCommand, release::BuildError, vfs::MemoryFs};
    use std::{cell::Cell, path::Path};

    struct FakeBuilder {
        exit_code: Option<i32>,
        calls: Cell<usize>,
    }
    impl FakeBuilder {
        fn succeeding() -> Self {
            Self {
                exit_code: None,
                calls: Cell::new(0),
            }
        }

        fn failing(code: i32) -> Self {
            Self {
                exit_code: Some(code),
                calls: Cell::new(0),
            }
        }
    }
    impl ReleaseBuilder for FakeBuilder {
        fn build(&self, command: &BuildCommand) -> Result<(), BuildError> {
            self.calls.set(self.calls.get() + 1);

            match self.exit_code {
                None => Ok(()),
                Some(code) => Err(BuildError::Failed {
                    command: command.to_string(),
                    code: Some(code),
                }),
            }
        }
    }

    fn fixture() -> MemoryFs {
        let mut fs = MemoryFs::new();
        fs.insert_file("resources/public/css/a.css", b"a").unwrap();
        fs
    }

    #[test]
    fn build_runs_before_assets_are_copied() {
        let builder = FakeBuilder::succeeding();
        let mut fs = fixture();

        let report = deploy_with(
            &DeployConfig::default(),
            DeployOptions::default(),
            &builder,
            &mut fs,
        )
        .unwrap();

        assert_eq!(builder.calls.get(), 1);
        assert_eq!(report.files_copied, 1);
        assert_eq!(fs.read("docs/css/a.css"), Some(&b"a"[..]));
    }

    #[test]
    fn failed_build_leaves_destination_untouched() {
        let builder = FakeBuilder::failing(1);
        let mut fs = fixture();
        let before = fs.clone();

        let error = deploy_with(
            &DeployConfig::default(),
            DeployOptions::default(),
            &builder,
            &mut fs,
        )
        .unwrap_err();

        assert!(matches!(error, DocshipError::Build(_)));
        assert_eq!(error.exit_code(), 1);
        assert_eq!(fs, before);
        assert!(!fs.exists(Path::new("docs")));
    }

    #[test]
    fn build_exit_code_is_propagated() {
        let builder = FakeBuilder::failing(42);

        let error = deploy_with(
            &DeployConfig::default(),
            DeployOptions::default(),
            &builder,
            &mut fixture(),
        )
        .unwrap_err();

        assert_eq!(error.exit_code(), 42);
    }

    #[test]
    fn skip_build_does_not_invoke_builder() {
        let builder = FakeBuilder::failing(1);
        let mut fs = fixture();

        deploy_with(
            &DeployConfig::default(),
            DeployOptions { skip_build: true },
            &builder,
            &mut fs,
        )
        .unwrap();

        assert_eq!(builder.calls.get(), 0);
        assert!(fs.exists(Path::new("docs/.nojekyll")));
    }

    #[test]
    fn preview_writes_nothing() {
        let fs = fixture();

        preview(&DeployConfig::default(), &fs).unwrap();

        assert!(fs.paths_under("docs").is_empty());
    }
}
