//! Orchestration: input validation, per-target dispatch, deduplication and
//! the aggregate size budget.

use crate::binary;
use crate::config::ContextOptions;
use crate::error::{AppError, Result};
use crate::ledger::SizeLedger;
use crate::processor::{process_entry, root_relative, EntryRecord, ProcessOutcome};
use crate::walker::ContextWalker;
use indexmap::IndexSet;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Separator between adjacent content blocks: exactly one blank line.
pub const SEPARATOR: &str = "\n\n";

/// Gather the consolidated context of `targets` under `project_root`.
///
/// Empty `targets` means the whole project root. File targets bypass rule
/// evaluation entirely (binary and size checks still apply); directory
/// targets become walk roots with rule discovery anchored at themselves.
/// Output paths are always relative to `project_root`, forward-slashed.
///
/// A single size budget spans all targets. When it overflows, the error
/// carries the configured limit, the observed aggregate and the ten largest
/// files involved.
pub fn read_context(
    project_root: &Path,
    targets: &[PathBuf],
    options: &ContextOptions,
) -> Result<String> {
    let root = project_root
        .canonicalize()
        .map_err(|_| AppError::InvalidRoot {
            path: project_root.to_path_buf(),
        })?;
    if !root.is_dir() {
        return Err(AppError::InvalidRoot {
            path: project_root.to_path_buf(),
        });
    }

    let requested: Vec<PathBuf> = if targets.is_empty() {
        vec![root.clone()]
    } else {
        targets.to_vec()
    };

    let mut file_targets: Vec<PathBuf> = Vec::new();
    let mut dir_targets: Vec<PathBuf> = Vec::new();
    let mut explicit_targets: HashSet<PathBuf> = HashSet::new();
    for target in &requested {
        let resolved = target
            .canonicalize()
            .map_err(|_| AppError::TargetNotFound {
                target: target.clone(),
            })?;
        if !resolved.starts_with(&root) {
            return Err(AppError::TargetOutsideRoot {
                target: resolved,
                root: root.clone(),
            });
        }
        if resolved.is_dir() {
            dir_targets.push(resolved.clone());
        } else if resolved.is_file() {
            file_targets.push(resolved.clone());
        } else {
            log::warn!(
                "Target is neither a file nor a directory, skipping: {}",
                resolved.display()
            );
            continue;
        }
        explicit_targets.insert(resolved);
    }

    if options.overrides_active() {
        log::info!("Override rules active; .contextfiles, .gitignore and defaults are ignored.");
    }

    let mut ledger = SizeLedger::new(options.effective_size_limit());
    let mut emitted: IndexSet<PathBuf> = IndexSet::new();
    let mut parts: Vec<String> = Vec::new();

    let outcome = process_targets(
        &root,
        &file_targets,
        &dir_targets,
        &explicit_targets,
        options,
        &mut ledger,
        &mut emitted,
        &mut parts,
    );

    match outcome {
        Ok(()) => {
            log::info!(
                "Gathered {} files, {} content bytes.",
                emitted.len(),
                ledger.content_bytes()
            );
            let separator = if options.list_only { "\n" } else { SEPARATOR };
            Ok(parts.join(separator))
        }
        Err(AppError::SizeLimitExceeded {
            limit_bytes,
            observed_bytes,
            ..
        }) => {
            // Re-raise with the diagnostic enriched by a scan of the whole
            // root, so offenders the walk never reached are still named.
            let largest_files = ledger.diagnostic_files(&root);
            Err(AppError::SizeLimitExceeded {
                limit_bytes,
                observed_bytes,
                largest_files,
            })
        }
        Err(err) => Err(err),
    }
}

#[allow(clippy::too_many_arguments)]
fn process_targets(
    root: &Path,
    file_targets: &[PathBuf],
    dir_targets: &[PathBuf],
    explicit_targets: &HashSet<PathBuf>,
    options: &ContextOptions,
    ledger: &mut SizeLedger,
    emitted: &mut IndexSet<PathBuf>,
    parts: &mut Vec<String>,
) -> Result<()> {
    for file in file_targets {
        if emitted.contains(file) {
            continue;
        }
        if binary::is_binary(file) {
            log::warn!("Skipping binary target file: {}", file.display());
            if options.debug_explain {
                parts.push(format!(
                    "[skipped binary target: {}]",
                    root_relative(file, root)
                ));
            }
            continue;
        }
        let size = fs::metadata(file)?.len();
        let record = EntryRecord::new(file.clone(), root, size);
        emit_entry(record, options, ledger, emitted, parts)?;
    }

    for dir in dir_targets {
        let mut walker = ContextWalker::new(dir, root, explicit_targets, options)?;
        walker.walk(ledger, emitted, parts)?;
    }
    Ok(())
}

/// Shared emission path for the orchestrator and the walker: render, record
/// in the ledger, then enforce the aggregate budget.
pub(crate) fn emit_entry(
    record: EntryRecord,
    options: &ContextOptions,
    ledger: &mut SizeLedger,
    emitted: &mut IndexSet<PathBuf>,
    parts: &mut Vec<String>,
) -> Result<()> {
    match process_entry(
        &record,
        options.list_only,
        options.include_sizes,
        options.debug_explain,
    ) {
        ProcessOutcome::Rendered {
            text,
            content_bytes,
        } => {
            ledger.record(&record.rel_path, record.size);
            ledger.add_content(content_bytes);
            emitted.insert(record.abs_path);
            parts.push(text);
            if ledger.over_limit() {
                return Err(AppError::SizeLimitExceeded {
                    limit_bytes: ledger.limit_bytes(),
                    observed_bytes: ledger.content_bytes(),
                    largest_files: ledger.largest_files().to_vec(),
                });
            }
        }
        ProcessOutcome::Skipped { note } => {
            if let Some(note) = note {
                parts.push(note);
            }
        }
    }
    Ok(())
}
