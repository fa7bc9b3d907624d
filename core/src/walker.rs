//! Deterministic top-down traversal of a single walk target.
//!
//! Rule discovery and matching are relative to the walk target; output paths
//! are relative to the project root. The walker keeps one stack per
//! discovered rule kind so the composed order is always: defaults, then
//! every `.gitignore` from the walk target down to the current directory,
//! then every `.contextfiles` over the same span. Patterns inside a
//! subdirectory anchor to that subdirectory and cannot affect anything
//! above it.

use crate::binary;
use crate::config::ContextOptions;
use crate::error::{AppError, Result};
use crate::ledger::SizeLedger;
use crate::processor::EntryRecord;
use crate::rules::{self, RuleLayer, RuleSource};
use crate::spec::{Classification, CompiledLayer, EffectiveSpec};
use indexmap::IndexSet;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub struct ContextWalker<'a> {
    walk_target: &'a Path,
    project_root: &'a Path,
    explicit_targets: &'a HashSet<PathBuf>,
    options: &'a ContextOptions,
    defaults: Option<CompiledLayer>,
    override_layer: Option<CompiledLayer>,
    gitignore_layers: Vec<CompiledLayer>,
    contextfile_layers: Vec<CompiledLayer>,
}

impl<'a> ContextWalker<'a> {
    /// `walk_target` must be a canonical directory beneath (or equal to) the
    /// canonical `project_root`.
    pub fn new(
        walk_target: &'a Path,
        project_root: &'a Path,
        explicit_targets: &'a HashSet<PathBuf>,
        options: &'a ContextOptions,
    ) -> Result<Self> {
        let (defaults, override_layer) = if options.overrides_active() {
            let layer = RuleLayer::new(RuleSource::Override, &options.override_rules);
            (None, Some(CompiledLayer::compile(&layer)?))
        } else {
            (Some(CompiledLayer::compile(&RuleLayer::defaults())?), None)
        };
        Ok(ContextWalker {
            walk_target,
            project_root,
            explicit_targets,
            options,
            defaults,
            override_layer,
            gitignore_layers: Vec::new(),
            contextfile_layers: Vec::new(),
        })
    }

    pub fn walk(
        &mut self,
        ledger: &mut SizeLedger,
        emitted: &mut IndexSet<PathBuf>,
        parts: &mut Vec<String>,
    ) -> Result<()> {
        log::debug!("Walking target: {}", self.walk_target.display());
        let target = self.walk_target.to_path_buf();
        self.visit(&target, ledger, emitted, parts)
    }

    fn visit(
        &mut self,
        dir: &Path,
        ledger: &mut SizeLedger,
        emitted: &mut IndexSet<PathBuf>,
        parts: &mut Vec<String>,
    ) -> Result<()> {
        if self.options.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let (pushed_gitignore, pushed_contextfile) = self.push_discovered_layers(dir)?;

        let mut files: Vec<(PathBuf, u64)> = Vec::new();
        let mut subdirs: Vec<PathBuf> = Vec::new();
        {
            let spec = self.effective_spec();
            let mut entries: Vec<fs::DirEntry> =
                fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
            entries.sort_by_key(|entry| entry.file_name());

            for entry in &entries {
                let file_type = entry.file_type()?;
                let abs = entry.path();
                if file_type.is_symlink() {
                    log::trace!("Skipping symlink: {}", abs.display());
                    continue;
                }
                let rel = abs
                    .strip_prefix(self.walk_target)
                    .expect("walked entries stay under the walk target");

                if file_type.is_dir() {
                    if self.explicit_targets.contains(&abs) {
                        self.explain(rel, "directory kept: explicit target");
                        subdirs.push(abs);
                    } else if self.classify(&spec, rel, true) == Classification::Excluded {
                        self.explain(rel, "directory pruned");
                    } else {
                        subdirs.push(abs);
                    }
                } else if file_type.is_file() {
                    let included = self.explicit_targets.contains(&abs)
                        || self.classify(&spec, rel, false) != Classification::Excluded;
                    if included {
                        files.push((abs, entry.metadata()?.len()));
                    } else {
                        self.explain(rel, "file excluded");
                    }
                }
            }
        }

        for (abs, size) in files {
            if emitted.contains(&abs) {
                continue;
            }
            if binary::is_binary(&abs) {
                log::debug!("Skipping binary file: {}", abs.display());
                continue;
            }
            let record = EntryRecord::new(abs, self.project_root, size);
            crate::gather::emit_entry(record, self.options, ledger, emitted, parts)?;
        }

        for subdir in subdirs {
            self.visit(&subdir, ledger, emitted, parts)?;
        }

        if pushed_contextfile {
            self.contextfile_layers.pop();
        }
        if pushed_gitignore {
            self.gitignore_layers.pop();
        }
        Ok(())
    }

    /// Discover `.gitignore` and `.contextfiles` in `dir` and push their
    /// layers, anchored at `dir`. Returns which stacks grew so the caller
    /// can pop exactly what was pushed.
    fn push_discovered_layers(&mut self, dir: &Path) -> Result<(bool, bool)> {
        if self.override_layer.is_some() {
            return Ok((false, false));
        }
        let anchor = dir
            .strip_prefix(self.walk_target)
            .expect("visited directories stay under the walk target")
            .to_path_buf();

        let mut pushed_gitignore = false;
        let gitignore_path = dir.join(rules::GITIGNORE_FILENAME);
        if gitignore_path.is_file() {
            let lines = rules::load_discovered_rules(&gitignore_path);
            let layer = RuleLayer::new(RuleSource::Gitignore(anchor.clone()), &lines);
            if !layer.is_empty() {
                self.gitignore_layers.push(CompiledLayer::compile(&layer)?);
                pushed_gitignore = true;
            }
        }

        let mut pushed_contextfile = false;
        let contextfile_path = dir.join(rules::CONTEXT_FILENAME);
        if contextfile_path.is_file() {
            let lines = rules::load_discovered_rules(&contextfile_path);
            let layer = RuleLayer::new(RuleSource::Contextfile(anchor), &lines);
            if !layer.is_empty() {
                self.contextfile_layers.push(CompiledLayer::compile(&layer)?);
                pushed_contextfile = true;
            }
        }

        Ok((pushed_gitignore, pushed_contextfile))
    }

    fn effective_spec(&self) -> EffectiveSpec<'_> {
        if let Some(override_layer) = &self.override_layer {
            return EffectiveSpec::new(vec![override_layer]);
        }
        let mut layers: Vec<&CompiledLayer> = Vec::with_capacity(
            1 + self.gitignore_layers.len() + self.contextfile_layers.len(),
        );
        if let Some(defaults) = &self.defaults {
            layers.push(defaults);
        }
        layers.extend(self.gitignore_layers.iter());
        layers.extend(self.contextfile_layers.iter());
        EffectiveSpec::new(layers)
    }

    fn classify(&self, spec: &EffectiveSpec<'_>, rel: &Path, is_dir: bool) -> Classification {
        if !self.options.debug_explain {
            return spec.classify(rel, is_dir);
        }
        match spec.decide(rel, is_dir) {
            Some((classification, source)) => {
                log::debug!(
                    "{}: {:?} by {}",
                    rel.display(),
                    classification,
                    source.describe()
                );
                classification
            }
            None => {
                log::debug!("{}: unmatched, included by default", rel.display());
                Classification::Unmatched
            }
        }
    }

    fn explain(&self, rel: &Path, what: &str) {
        if self.options.debug_explain {
            log::debug!("{}: {}", rel.display(), what);
        }
    }
}
