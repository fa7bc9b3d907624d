//! Spec compilation: turning rule layers into a per-directory matcher.
//!
//! Each [`RuleLayer`] compiles once into a [`CompiledLayer`] wrapping a
//! `Gitignore` matcher anchored at the layer's directory. An
//! [`EffectiveSpec`] is the ordered view of every layer in scope for one
//! directory visit; classification walks the composition order with
//! last-match-wins, so later layers override earlier ones and the last
//! matching pattern inside a layer overrides its predecessors.

use crate::error::Result;
use crate::rules::{RuleLayer, RuleSource};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::Match;
use std::path::{Path, PathBuf};

/// Outcome of matching one candidate path against an [`EffectiveSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Included,
    Excluded,
    Unmatched,
}

/// A rule layer with its matcher built. Compiled once when the layer enters
/// scope and reused for every candidate beneath it.
#[derive(Debug)]
pub struct CompiledLayer {
    pub source: RuleSource,
    anchor: PathBuf,
    matcher: Gitignore,
}

impl CompiledLayer {
    pub fn compile(layer: &RuleLayer) -> Result<Self> {
        let mut builder = GitignoreBuilder::new("");
        for pattern in &layer.patterns {
            if let Err(err) = builder.add_line(None, &pattern.raw) {
                log::warn!(
                    "Skipping invalid pattern '{}' from {}: {}",
                    pattern.raw,
                    layer.source.describe(),
                    err
                );
            }
        }
        Ok(CompiledLayer {
            anchor: layer.source.anchor().to_path_buf(),
            matcher: builder.build()?,
            source: layer.source.clone(),
        })
    }

    /// Match a candidate given by its path relative to the walk target.
    /// Returns `None` when no pattern in this layer matches, or when the
    /// candidate is not beneath the layer's anchor.
    fn decide(&self, rel_path: &Path, is_dir: bool) -> Option<Classification> {
        let local = rel_path.strip_prefix(&self.anchor).ok()?;
        if local.as_os_str().is_empty() {
            return None;
        }
        match self.matcher.matched(local, is_dir) {
            Match::None => None,
            Match::Ignore(_) => Some(Classification::Excluded),
            Match::Whitelist(_) => Some(Classification::Included),
        }
    }
}

/// The matcher for one directory visit: every layer in scope, in composition
/// order. Built, used and discarded within that directory's scope.
pub struct EffectiveSpec<'a> {
    layers: Vec<&'a CompiledLayer>,
}

impl<'a> EffectiveSpec<'a> {
    /// `layers` must already be in composition order (defaults first, then
    /// `.gitignore` layers walk-target-down, then `.contextfiles` layers
    /// walk-target-down — or the single override layer).
    pub fn new(layers: Vec<&'a CompiledLayer>) -> Self {
        EffectiveSpec { layers }
    }

    pub fn classify(&self, rel_path: &Path, is_dir: bool) -> Classification {
        self.decide(rel_path, is_dir)
            .map(|(classification, _)| classification)
            .unwrap_or(Classification::Unmatched)
    }

    /// Like [`Self::classify`], but also names the deciding rule source.
    /// Last match wins, so layers are consulted in reverse composition
    /// order and the first decisive layer answers.
    pub fn decide(&self, rel_path: &Path, is_dir: bool) -> Option<(Classification, &RuleSource)> {
        self.layers.iter().rev().find_map(|layer| {
            layer
                .decide(rel_path, is_dir)
                .map(|classification| (classification, &layer.source))
        })
    }
}
