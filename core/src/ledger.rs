//! Aggregate size accounting and the largest-files diagnostic data.

use crate::error::LargeFile;
use crate::rules::RuleLayer;
use crate::spec::{Classification, CompiledLayer, EffectiveSpec};
use std::path::Path;
use walkdir::WalkDir;

/// How many offenders the oversize diagnostic names.
pub const TOP_LARGEST: usize = 10;

/// Running aggregate of emitted content bytes plus a bounded buffer of the
/// largest files seen. Owned by the orchestrator, threaded through the
/// walker by mutable reference.
#[derive(Debug)]
pub struct SizeLedger {
    limit_bytes: u64,
    content_bytes: u64,
    largest: Vec<LargeFile>,
}

impl SizeLedger {
    pub fn new(limit_bytes: u64) -> Self {
        SizeLedger {
            limit_bytes,
            content_bytes: 0,
            largest: Vec::with_capacity(TOP_LARGEST + 1),
        }
    }

    pub fn limit_bytes(&self) -> u64 {
        self.limit_bytes
    }

    pub fn content_bytes(&self) -> u64 {
        self.content_bytes
    }

    pub fn add_content(&mut self, bytes: u64) {
        self.content_bytes += bytes;
    }

    /// Track a file's raw size for the diagnostic. Called for every rendered
    /// file in both content and list modes.
    pub fn record(&mut self, rel_path: &str, size_bytes: u64) {
        self.largest.push(LargeFile {
            rel_path: rel_path.to_string(),
            size_bytes,
        });
        self.largest.sort_by(compare_large_files);
        self.largest.truncate(TOP_LARGEST);
    }

    pub fn over_limit(&self) -> bool {
        self.content_bytes > self.limit_bytes
    }

    pub fn largest_files(&self) -> &[LargeFile] {
        &self.largest
    }

    /// Diagnostic payload: the files this run saw, merged with a
    /// defaults-filtered scan of the project root so offenders the walk
    /// never reached are still named.
    pub fn diagnostic_files(&self, project_root: &Path) -> Vec<LargeFile> {
        let mut merged = self.largest.clone();
        for found in scan_largest_files(project_root, TOP_LARGEST) {
            if !merged.iter().any(|seen| seen.rel_path == found.rel_path) {
                merged.push(found);
            }
        }
        merged.sort_by(compare_large_files);
        merged.truncate(TOP_LARGEST);
        merged
    }
}

fn compare_large_files(a: &LargeFile, b: &LargeFile) -> std::cmp::Ordering {
    b.size_bytes
        .cmp(&a.size_bytes)
        .then_with(|| a.rel_path.cmp(&b.rel_path))
}

/// Flat scan of the project root for its largest files, pruning the built-in
/// default exclusions and never following symlinks.
pub fn scan_largest_files(root: &Path, top_n: usize) -> Vec<LargeFile> {
    let defaults = match CompiledLayer::compile(&RuleLayer::defaults()) {
        Ok(layer) => layer,
        Err(err) => {
            log::warn!("Could not compile default rules for the size scan: {}", err);
            return Vec::new();
        }
    };
    let spec = EffectiveSpec::new(vec![&defaults]);

    let mut files: Vec<LargeFile> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
            spec.classify(rel, entry.file_type().is_dir()) != Classification::Excluded
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let size = entry.metadata().ok()?.len();
            Some(LargeFile {
                rel_path: crate::processor::root_relative(entry.path(), root),
                size_bytes: size,
            })
        })
        .collect();

    files.sort_by(compare_large_files);
    files.truncate(top_n);
    files
}
