pub mod binary;
pub mod config;
pub mod error;
pub mod gather;
pub mod ledger;
pub mod processor;
pub mod rules;
pub mod spec;
pub mod walker;

pub use config::{CancelFlag, ContextOptions, DEFAULT_SIZE_LIMIT_BYTES, ENV_SIZE_LIMIT_MB};
pub use error::{AppError, LargeFile, Result};
pub use gather::read_context;
pub use ledger::{scan_largest_files, SizeLedger, TOP_LARGEST};
pub use processor::EntryRecord;
pub use rules::{
    load_rule_file, Pattern, RuleLayer, RuleSource, CONTEXT_FILENAME, DEFAULT_RULES,
    GITIGNORE_FILENAME,
};
pub use spec::{Classification, CompiledLayer, EffectiveSpec};
pub use walker::ContextWalker;
