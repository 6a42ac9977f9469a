use crate::{
    config::{AssetEntry, AssetKind, DeployConfig},
    errors::{FileOperation, IoError},
    vfs::FileSystem,
};
use colored::Colorize;
use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum DeployerError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Io(#[from] IoError),

    #[error("{label} not found at '{path}'")]
    #[diagnostic(
        code(docship::deployer::missing_asset),
        help("This asset is mandatory; create it or mark it optional in the config")
    )]
    MissingAsset { label: String, path: PathBuf },

    #[error("{label} at '{path}' is not a {expected}")]
    #[diagnostic(code(docship::deployer::kind_mismatch))]
    KindMismatch {
        label: String,
        path: PathBuf,
        expected: AssetKind,
    },
}

/// A single filesystem change derived while planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    CreateDir { path: PathBuf },
    CopyFile { source: PathBuf, destination: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetPlan {
    Copy {
        label: String,
        operations: Vec<Operation>,
    },
    /// Optional asset whose source is absent.
    Skip { label: String, source: PathBuf },
}

/// Everything a deploy will do, in order. Built fresh from the filesystem and
/// consumed right away by [`apply`] or the preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployPlan {
    pub dest_root: PathBuf,
    pub assets: Vec<AssetPlan>,
    pub marker: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied { files: usize },
    Skipped,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub files_copied: usize,
    /// `create_dir_all` calls, whether or not the directory already existed.
    pub directories_ensured: usize,
    pub copied: Vec<String>,
    pub skipped: Vec<String>,
}

/// Walks `source` and queues a [`Operation::CreateDir`] for `destination`
/// followed by the operations for each immediate entry, recursing into
/// subdirectories.
fn plan_directory<F: FileSystem>(
    fs: &F,
    source: &Path,
    destination: &Path,
    operations: &mut Vec<Operation>,
) -> Result<(), DeployerError> {
    operations.push(Operation::CreateDir {
        path: destination.to_path_buf(),
    });

    let entries = fs
        .list_entries(source)
        .map_err(|error| IoError::new(FileOperation::List, source.to_path_buf(), error))?;

    for entry in entries {
        let Some(name) = entry.path.file_name() else {
            continue;
        };
        let target = destination.join(name);

        if entry.is_dir {
            plan_directory(fs, &entry.path, &target, operations)?;
        } else {
            operations.push(Operation::CopyFile {
                source: entry.path,
                destination: target,
            });
        }
    }

    Ok(())
}

/// Resolves one [`AssetEntry`] against the roots and derives its operations.
pub fn plan_entry<F: FileSystem>(
    fs: &F,
    entry: &AssetEntry,
    source_root: &Path,
    dest_root: &Path,
) -> Result<AssetPlan, DeployerError> {
    let source = source_root.join(&entry.source);
    let destination = dest_root.join(&entry.destination);

    if !fs.exists(&source) {
        if entry.optional {
            return Ok(AssetPlan::Skip {
                label: entry.label.clone(),
                source,
            });
        }

        return Err(DeployerError::MissingAsset {
            label: entry.label.clone(),
            path: source,
        });
    }

    if fs.is_dir(&source) != (entry.kind == AssetKind::Directory) {
        return Err(DeployerError::KindMismatch {
            label: entry.label.clone(),
            path: source,
            expected: entry.kind,
        });
    }

    let mut operations = Vec::new();

    match entry.kind {
        AssetKind::Directory => plan_directory(fs, &source, &destination, &mut operations)?,
        AssetKind::File => {
            if let Some(parent) = destination.parent() {
                if !parent.as_os_str().is_empty() {
                    operations.push(Operation::CreateDir {
                        path: parent.to_path_buf(),
                    });
                }
            }

            operations.push(Operation::CopyFile {
                source,
                destination,
            });
        }
    }

    Ok(AssetPlan::Copy {
        label: entry.label.clone(),
        operations,
    })
}

/// Plans every asset of `config` in order. Nothing is written.
pub fn plan<F: FileSystem>(fs: &F, config: &DeployConfig) -> Result<DeployPlan, DeployerError> {
    let assets = config
        .assets
        .iter()
        .map(|entry| plan_entry(fs, entry, &config.source_root, &config.dest_root))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DeployPlan {
        dest_root: config.dest_root.clone(),
        assets,
        marker: config.marker_path(),
    })
}

fn run_operations<F: FileSystem>(
    fs: &mut F,
    operations: &[Operation],
    report: &mut DeployReport,
) -> Result<usize, DeployerError> {
    let mut files = 0;

    for operation in operations {
        match operation {
            Operation::CreateDir { path } => {
                fs.create_dir_all(path)
                    .map_err(|error| IoError::new(FileOperation::Mkdir, path.clone(), error))?;

                report.directories_ensured += 1;
            }
            Operation::CopyFile {
                source,
                destination,
            } => {
                let bytes = fs.copy_file(source, destination).map_err(|error| {
                    IoError::new(FileOperation::Copy, destination.clone(), error)
                })?;

                log::debug!(
                    "copied {} -> {} ({} bytes)",
                    source.display(),
                    destination.display(),
                    bytes
                );

                files += 1;
            }
        }
    }

    report.files_copied += files;

    Ok(files)
}

/// Creates the parent of `marker` and writes it as an empty file, truncating
/// whatever was there.
pub fn write_marker<F: FileSystem>(fs: &mut F, marker: &Path) -> Result<(), DeployerError> {
    if let Some(parent) = marker.parent() {
        if !parent.as_os_str().is_empty() {
            fs.create_dir_all(parent)
                .map_err(|error| IoError::new(FileOperation::Mkdir, parent.to_path_buf(), error))?;
        }
    }

    fs.write_file(marker, &[])
        .map_err(|error| IoError::new(FileOperation::Write, marker.to_path_buf(), error))?;

    Ok(())
}

/// Executes a [`DeployPlan`], then writes the marker.
///
/// Files already in the destination without a source counterpart are left alone.
pub fn apply<F: FileSystem>(fs: &mut F, plan: &DeployPlan) -> Result<DeployReport, DeployerError> {
    let mut report = DeployReport::default();

    for asset in &plan.assets {
        match asset {
            AssetPlan::Copy { label, operations } => {
                run_operations(fs, operations, &mut report)?;

                println!("  {} {} copied", "✓".green(), label);

                report.copied.push(label.clone());
            }
            AssetPlan::Skip { label, source } => {
                log::info!("skipping {}: '{}' not found", label, source.display());

                report.skipped.push(label.clone());
            }
        }
    }

    write_marker(fs, &plan.marker)?;

    let marker_name = plan
        .marker
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| plan.marker.display().to_string());

    println!("  {} {} file created", "✓".green(), marker_name);

    Ok(report)
}

/// Copies a single asset from `source_root` into `dest_root`.
///
/// # Errors
///
/// Returns a [`DeployerError`] if:
///
/// - A mandatory source is missing or has the wrong kind.
/// - A directory cannot be listed or created.
/// - A file cannot be copied.
pub fn copy<F: FileSystem>(
    fs: &mut F,
    entry: &AssetEntry,
    source_root: &Path,
    dest_root: &Path,
) -> Result<CopyOutcome, DeployerError> {
    match plan_entry(fs, entry, source_root, dest_root)? {
        AssetPlan::Copy { operations, .. } => {
            let mut report = DeployReport::default();
            let files = run_operations(fs, &operations, &mut report)?;

            Ok(CopyOutcome::Copied { files })
        }
        AssetPlan::Skip { .. } => Ok(CopyOutcome::Skipped),
    }
}

/// Plans and applies every asset of `config`, then writes the marker.
pub fn deploy_assets<F: FileSystem>(
    fs: &mut F,
    config: &DeployConfig,
) -> Result<DeployReport, DeployerError> {
    let plan = plan(fs, config)?;

    apply(fs, &plan)
}
